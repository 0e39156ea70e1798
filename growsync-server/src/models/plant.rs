use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Plant {
    pub id: i32,
    /// Timestamp-based external identifier.
    pub plant_id: String,
    pub name: String,
    pub user_id: i32,
    pub location_id: Option<i32>,
    pub start_date: OffsetDateTime,
    /// NULL while the plant is active; set when finished/harvested.
    pub end_date: Option<OffsetDateTime>,
    pub current_phase: Option<String>,
}

#[derive(Clone)]
pub struct PlantTable;

impl Table for PlantTable {
    fn name(&self) -> &'static str {
        "plants"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS plants (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plant_id TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                location_id INTEGER,
                start_date DATETIME NOT NULL,
                end_date DATETIME,
                current_phase TEXT,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
                FOREIGN KEY (location_id) REFERENCES locations (id) ON DELETE SET NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS plants;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users", "locations"]
    }
}
