use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

/// Pins a device to a specific firmware version instead of the type's
/// latest. `force_update` is a one-shot flag cleared once the device has
/// confirmed the target version.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceFirmwareAssignment {
    pub id: i32,
    pub device_id: i32,
    pub firmware_id: i32,
    pub force_update: bool,
    pub notes: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct DeviceFirmwareAssignmentTable;

impl Table for DeviceFirmwareAssignmentTable {
    fn name(&self) -> &'static str {
        "device_firmware_assignments"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS device_firmware_assignments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id INTEGER NOT NULL UNIQUE,
                firmware_id INTEGER NOT NULL,
                force_update BOOLEAN NOT NULL DEFAULT FALSE,
                notes TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (device_id) REFERENCES devices (id) ON DELETE CASCADE,
                FOREIGN KEY (firmware_id) REFERENCES firmware (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS device_firmware_assignments;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["devices", "firmware"]
    }
}
