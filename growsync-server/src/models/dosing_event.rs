use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::models::Table;

/// Append-only record of a single dosing occurrence. The unique key on
/// (plant_id, timestamp, dosing_type) rejects replayed report chunks.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DosingEvent {
    pub id: i32,
    pub plant_id: i32,
    pub device_id: i32,
    pub event_date: Date,
    pub timestamp: OffsetDateTime,
    pub dosing_type: String,
    pub amount_ml: f64,
    pub created_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct DosingEventTable;

impl Table for DosingEventTable {
    fn name(&self) -> &'static str {
        "dosing_events"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS dosing_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plant_id INTEGER NOT NULL,
                device_id INTEGER NOT NULL,
                event_date DATE NOT NULL,
                timestamp DATETIME NOT NULL,
                dosing_type TEXT NOT NULL,
                amount_ml REAL NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (plant_id, timestamp, dosing_type),
                FOREIGN KEY (plant_id) REFERENCES plants (id) ON DELETE CASCADE,
                FOREIGN KEY (device_id) REFERENCES devices (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS dosing_events;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["plants", "devices"]
    }
}
