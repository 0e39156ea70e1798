use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::PostingSlot;

pub struct PostingSlotRepository {
    storage: Arc<Storage>,
}

impl PostingSlotRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn find_by_device_id(&self, device_id: i32) -> Result<Option<PostingSlot>, Error> {
        let slot: Option<PostingSlot> =
            sqlx::query_as("SELECT * FROM device_posting_slots WHERE device_id = $1")
                .bind(device_id)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(slot)
    }

    /// Every assigned minute offset, sorted ascending — the allocator's
    /// gap-scan input.
    pub async fn assigned_minutes(&self) -> Result<Vec<i32>, Error> {
        let minutes: Vec<i32> = sqlx::query_scalar(
            "SELECT assigned_minute FROM device_posting_slots ORDER BY assigned_minute",
        )
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(minutes)
    }

    pub async fn insert(&self, device_id: i32, assigned_minute: i32) -> Result<(), Error> {
        let now = OffsetDateTime::now_utc();

        sqlx::query(
            r#"
            INSERT INTO device_posting_slots (device_id, assigned_minute, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            "#,
        )
        .bind(device_id)
        .bind(assigned_minute)
        .bind(now)
        .execute(self.storage.get_pool())
        .await?;

        Ok(())
    }

    pub async fn insert_in(
        &self,
        device_id: i32,
        assigned_minute: i32,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        let now = OffsetDateTime::now_utc();

        sqlx::query(
            r#"
            INSERT INTO device_posting_slots (device_id, assigned_minute, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            "#,
        )
        .bind(device_id)
        .bind(assigned_minute)
        .bind(now)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }

    pub async fn delete_all_in(
        &self,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query("DELETE FROM device_posting_slots")
            .execute(&mut **transaction)
            .await?;

        Ok(())
    }

    /// Returns whether a slot row existed for the device.
    pub async fn delete_by_device_id(&self, device_id: i32) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM device_posting_slots WHERE device_id = $1")
            .bind(device_id)
            .execute(self.storage.get_pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
