use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LocationShare {
    pub id: i32,
    pub location_id: i32,
    pub owner_user_id: i32,
    pub shared_with_user_id: Option<i32>,
    pub share_code: String,
    pub permission_level: String,
    pub created_at: OffsetDateTime,
    pub expires_at: Option<OffsetDateTime>,
    pub accepted_at: Option<OffsetDateTime>,
    pub revoked_at: Option<OffsetDateTime>,
    pub is_active: bool,
}

#[derive(Clone)]
pub struct LocationShareTable;

impl Table for LocationShareTable {
    fn name(&self) -> &'static str {
        "location_shares"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS location_shares (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                location_id INTEGER NOT NULL,
                owner_user_id INTEGER NOT NULL,
                shared_with_user_id INTEGER,
                share_code TEXT NOT NULL UNIQUE,
                permission_level TEXT NOT NULL DEFAULT 'viewer',
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                expires_at DATETIME,
                accepted_at DATETIME,
                revoked_at DATETIME,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                FOREIGN KEY (location_id) REFERENCES locations (id) ON DELETE CASCADE,
                FOREIGN KEY (owner_user_id) REFERENCES users (id) ON DELETE CASCADE,
                FOREIGN KEY (shared_with_user_id) REFERENCES users (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS location_shares;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["locations", "users"]
    }
}
