use std::sync::Arc;

use sqlx::Error;
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::Device;

pub struct DeviceRepository {
    storage: Arc<Storage>,
}

impl DeviceRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Device>, Error> {
        let device: Option<Device> = sqlx::query_as("SELECT * FROM devices WHERE id = $1")
            .bind(id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(device)
    }

    pub async fn find_by_external_id(&self, device_id: &str) -> Result<Option<Device>, Error> {
        let device: Option<Device> = sqlx::query_as("SELECT * FROM devices WHERE device_id = $1")
            .bind(device_id)
            .fetch_optional(self.storage.get_pool())
            .await?;

        Ok(device)
    }

    /// Authentication lookup for device endpoints: the (device_id, api_key)
    /// pair must match exactly.
    pub async fn find_by_credentials(
        &self,
        device_id: &str,
        api_key: &str,
    ) -> Result<Option<Device>, Error> {
        let device: Option<Device> =
            sqlx::query_as("SELECT * FROM devices WHERE device_id = $1 AND api_key = $2")
                .bind(device_id)
                .bind(api_key)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(device)
    }

    /// Devices that post nightly reports, in creation order. Creation order
    /// doubles as the rebalance ordinal.
    pub async fn find_slot_eligible(&self) -> Result<Vec<Device>, Error> {
        let devices: Vec<Device> = sqlx::query_as(
            r#"
            SELECT * FROM devices
            WHERE device_type IN ('hydro_controller', 'hydroponic_controller', 'environmental')
            ORDER BY id
            "#,
        )
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(devices)
    }

    pub async fn count_slot_eligible(&self) -> Result<i64, Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(id) FROM devices
            WHERE device_type IN ('hydro_controller', 'hydroponic_controller', 'environmental')
            "#,
        )
        .fetch_one(self.storage.get_pool())
        .await?;

        Ok(count)
    }

    pub async fn mark_online(&self, id: i32) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET is_online = TRUE, last_seen = $1 WHERE id = $2")
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .execute(self.storage.get_pool())
            .await?;

        Ok(())
    }

    pub async fn mark_offline(&self, id: i32) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET is_online = FALSE, last_seen = $1 WHERE id = $2")
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .execute(self.storage.get_pool())
            .await?;

        Ok(())
    }

    pub async fn update_settings(&self, id: i32, settings: &str) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET settings = $1 WHERE id = $2")
            .bind(settings)
            .bind(id)
            .execute(self.storage.get_pool())
            .await?;

        Ok(())
    }

    /// Persists metadata a device self-reported over its relay channel.
    pub async fn update_reported_type(
        &self,
        id: i32,
        device_type: &str,
        scope: &str,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET device_type = $1, scope = $2 WHERE id = $3")
            .bind(device_type)
            .bind(scope)
            .bind(id)
            .execute(self.storage.get_pool())
            .await?;

        Ok(())
    }

    pub async fn update_capabilities(&self, id: i32, capabilities: &str) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET capabilities = $1 WHERE id = $2")
            .bind(capabilities)
            .bind(id)
            .execute(self.storage.get_pool())
            .await?;

        Ok(())
    }

    pub async fn update_system_name(&self, id: i32, system_name: &str) -> Result<(), Error> {
        sqlx::query("UPDATE devices SET system_name = $1 WHERE id = $2")
            .bind(system_name)
            .bind(id)
            .execute(self.storage.get_pool())
            .await?;

        Ok(())
    }
}
