use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

/// Temporal link between a controller and a plant. `removed_at` NULL means
/// currently active; at most one active assignment per plant.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceAssignment {
    pub id: i32,
    pub plant_id: i32,
    pub device_id: i32,
    pub assigned_at: OffsetDateTime,
    pub removed_at: Option<OffsetDateTime>,
}

#[derive(Clone)]
pub struct DeviceAssignmentTable;

impl Table for DeviceAssignmentTable {
    fn name(&self) -> &'static str {
        "device_assignments"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS device_assignments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plant_id INTEGER NOT NULL,
                device_id INTEGER NOT NULL,
                assigned_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                removed_at DATETIME,
                FOREIGN KEY (plant_id) REFERENCES plants (id) ON DELETE CASCADE,
                FOREIGN KEY (device_id) REFERENCES devices (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS device_assignments;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["plants", "devices"]
    }
}
