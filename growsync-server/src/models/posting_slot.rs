use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

/// One-to-one with a reporting device: the minute offset inside the
/// nightly posting window the device is scheduled to use.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostingSlot {
    pub id: i32,
    pub device_id: i32,
    pub assigned_minute: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct PostingSlotTable;

impl Table for PostingSlotTable {
    fn name(&self) -> &'static str {
        "device_posting_slots"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS device_posting_slots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id INTEGER NOT NULL UNIQUE,
                assigned_minute INTEGER NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (device_id) REFERENCES devices (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS device_posting_slots;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["devices"]
    }
}
