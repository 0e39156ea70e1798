use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

/// Device types that post nightly daily reports and therefore occupy a
/// posting slot.
pub const SLOT_ELIGIBLE_TYPES: &[&str] =
    &["hydro_controller", "hydroponic_controller", "environmental"];

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Device {
    pub id: i32,
    /// Stable external identifier the physical controller presents.
    pub device_id: String,
    pub api_key: String,
    /// User-set custom name.
    pub name: Option<String>,
    /// Device's self-reported name.
    pub system_name: Option<String>,
    pub device_type: String,
    /// `plant` (1:1) or `room` (fans out to every plant in the location).
    pub scope: String,
    pub is_online: bool,
    pub last_seen: Option<OffsetDateTime>,
    /// JSON text of self-reported capabilities.
    pub capabilities: Option<String>,
    /// JSON settings blob, parsed through `growsync_api::DeviceSettings`.
    pub settings: Option<String>,
    pub user_id: i32,
    pub location_id: Option<i32>,
}

impl Device {
    pub fn requires_posting_slot(&self) -> bool {
        SLOT_ELIGIBLE_TYPES.contains(&self.device_type.as_str())
    }

    pub fn is_hydro_controller(&self) -> bool {
        matches!(
            self.device_type.as_str(),
            "hydro_controller" | "hydroponic_controller"
        )
    }

    pub fn is_environmental(&self) -> bool {
        self.device_type == "environmental"
    }

    /// ESP-based types that accept a push `firmware_update` command over
    /// the relay channel.
    pub fn accepts_firmware_push(&self) -> bool {
        matches!(
            self.device_type.as_str(),
            "valve_controller" | "hydroponic_controller"
        )
    }

    pub fn scope_for_type(device_type: &str) -> &'static str {
        if device_type == "environmental" {
            "room"
        } else {
            "plant"
        }
    }
}

#[derive(Clone)]
pub struct DeviceTable;

impl Table for DeviceTable {
    fn name(&self) -> &'static str {
        "devices"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS devices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_id TEXT NOT NULL UNIQUE,
                api_key TEXT NOT NULL,
                name TEXT,
                system_name TEXT,
                device_type TEXT NOT NULL DEFAULT 'feeding_system',
                scope TEXT NOT NULL DEFAULT 'plant',
                is_online BOOLEAN NOT NULL DEFAULT FALSE,
                last_seen DATETIME,
                capabilities TEXT,
                settings TEXT,
                user_id INTEGER NOT NULL,
                location_id INTEGER,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
                FOREIGN KEY (location_id) REFERENCES locations (id) ON DELETE SET NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS devices;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["users", "locations"]
    }
}
