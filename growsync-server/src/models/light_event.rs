use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::models::Table;

/// Append-only record of one lights-ON period. Unique on
/// (plant_id, start_time) so replayed chunks cannot double-insert.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LightEvent {
    pub id: i32,
    pub plant_id: i32,
    pub device_id: i32,
    pub event_date: Date,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub duration_seconds: i64,
    pub created_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct LightEventTable;

impl Table for LightEventTable {
    fn name(&self) -> &'static str {
        "light_events"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS light_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plant_id INTEGER NOT NULL,
                device_id INTEGER NOT NULL,
                event_date DATE NOT NULL,
                start_time DATETIME NOT NULL,
                end_time DATETIME NOT NULL,
                duration_seconds INTEGER NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (plant_id, start_time),
                FOREIGN KEY (plant_id) REFERENCES plants (id) ON DELETE CASCADE,
                FOREIGN KEY (device_id) REFERENCES devices (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS light_events;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["plants", "devices"]
    }
}
