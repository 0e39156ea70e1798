use serde::{Deserialize, Serialize};

use crate::models::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
}

#[derive(Clone)]
pub struct LocationTable;

impl Table for LocationTable {
    fn name(&self) -> &'static str {
        "locations"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS locations;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users"]
    }
}
