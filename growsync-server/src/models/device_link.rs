use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Table;

/// One directed edge of the device connection graph, as self-reported by
/// the source device over its relay channel. Replaced wholesale on each
/// report; old edges are soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceLink {
    pub id: i32,
    pub source_device_id: i32,
    pub target_device_id: i32,
    pub created_at: OffsetDateTime,
    pub removed_at: Option<OffsetDateTime>,
}

#[derive(Clone)]
pub struct DeviceLinkTable;

impl Table for DeviceLinkTable {
    fn name(&self) -> &'static str {
        "device_links"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS device_links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_device_id INTEGER NOT NULL,
                target_device_id INTEGER NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                removed_at DATETIME,
                FOREIGN KEY (source_device_id) REFERENCES devices (id) ON DELETE CASCADE,
                FOREIGN KEY (target_device_id) REFERENCES devices (id) ON DELETE CASCADE
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS device_links;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["devices"]
    }
}
