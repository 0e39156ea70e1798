use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

/// One uploaded firmware binary for a device type. Binary storage itself
/// is a collaborator concern; only the metadata row lives here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Firmware {
    pub id: i32,
    pub device_type: String,
    pub version: String,
    pub release_notes: Option<String>,
    pub file_path: String,
    pub file_size: Option<i64>,
    pub checksum: Option<String>,
    /// The stable release devices without a pinned assignment should run.
    pub is_latest: bool,
    pub is_prerelease: bool,
    pub created_at: OffsetDateTime,
}

impl Firmware {
    pub fn download_url(&self) -> String {
        format!(
            "/api/firmware/download/{}/{}",
            self.device_type, self.version
        )
    }
}

#[derive(Clone)]
pub struct FirmwareTable;

impl Table for FirmwareTable {
    fn name(&self) -> &'static str {
        "firmware"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS firmware (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                device_type TEXT NOT NULL,
                version TEXT NOT NULL,
                release_notes TEXT,
                file_path TEXT NOT NULL,
                file_size INTEGER,
                checksum TEXT,
                is_latest BOOLEAN NOT NULL DEFAULT FALSE,
                is_prerelease BOOLEAN NOT NULL DEFAULT FALSE,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                UNIQUE (device_type, version)
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS firmware;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
