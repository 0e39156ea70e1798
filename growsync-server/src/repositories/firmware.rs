use std::sync::Arc;

use sqlx::Error;
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::{DeviceFirmwareAssignment, Firmware};

pub struct FirmwareRepository {
    storage: Arc<Storage>,
}

impl FirmwareRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Firmware>, Error> {
        let firmware: Option<Firmware> = sqlx::query_as("SELECT * FROM firmware WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(firmware)
    }

    pub async fn find_assignment_for_device(
        &self,
        device_id: i32,
    ) -> Result<Option<DeviceFirmwareAssignment>, Error> {
        let assignment: Option<DeviceFirmwareAssignment> =
            sqlx::query_as("SELECT * FROM device_firmware_assignments WHERE device_id = $1")
                .bind(device_id)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(assignment)
    }

    pub async fn find_latest_for_type(&self, device_type: &str) -> Result<Option<Firmware>, Error> {
        let firmware: Option<Firmware> =
            sqlx::query_as("SELECT * FROM firmware WHERE device_type = $1 AND is_latest = TRUE")
                .bind(device_type)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(firmware)
    }

    pub async fn clear_force_flag(&self, assignment_id: i32) -> Result<(), Error> {
        sqlx::query(
            "UPDATE device_firmware_assignments SET force_update = FALSE, updated_at = $1 WHERE id = $2",
        )
        .bind(OffsetDateTime::now_utc())
        .bind(assignment_id)
        .execute(self.storage.get_pool())
        .await?;

        Ok(())
    }

    /// Whether a force-update assignment is waiting for this device.
    pub async fn has_pending_force(&self, device_id: i32) -> Result<bool, Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(id) FROM device_firmware_assignments
            WHERE device_id = $1 AND force_update = TRUE
            "#,
        )
        .bind(device_id)
        .fetch_one(self.storage.get_pool())
        .await?;

        Ok(count > 0)
    }
}
