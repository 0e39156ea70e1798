use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::DeviceLink;

pub struct DeviceLinkRepository {
    storage: Arc<Storage>,
}

impl DeviceLinkRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn find_active_by_source(&self, source_device_id: i32) -> Result<Vec<DeviceLink>, Error> {
        let links: Vec<DeviceLink> = sqlx::query_as(
            "SELECT * FROM device_links WHERE source_device_id = $1 AND removed_at IS NULL",
        )
        .bind(source_device_id)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(links)
    }

    /// Replaces the device's outbound edges with the reported peer set:
    /// soft-deletes the current edges, then recreates one per target, all
    /// in the caller's transaction.
    pub async fn replace_links_in(
        &self,
        source_device_id: i32,
        target_device_ids: &[i32],
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        let now = OffsetDateTime::now_utc();

        sqlx::query(
            "UPDATE device_links SET removed_at = $1 WHERE source_device_id = $2 AND removed_at IS NULL",
        )
        .bind(now)
        .bind(source_device_id)
        .execute(&mut **transaction)
        .await?;

        for target_device_id in target_device_ids {
            sqlx::query(
                r#"
                INSERT INTO device_links (source_device_id, target_device_id, created_at)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(source_device_id)
            .bind(target_device_id)
            .bind(now)
            .execute(&mut **transaction)
            .await?;
        }

        Ok(())
    }
}
