use std::sync::Arc;

use sqlx::Error;
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::{DeviceShare, LocationShare};

pub struct ShareRepository {
    storage: Arc<Storage>,
}

impl ShareRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// A share only authorizes while it is active, accepted, not revoked,
    /// and not expired.
    pub async fn find_valid_device_share(
        &self,
        device_id: i32,
        user_id: i32,
    ) -> Result<Option<DeviceShare>, Error> {
        let share: Option<DeviceShare> = sqlx::query_as(
            r#"
            SELECT * FROM device_shares
            WHERE device_id = $1
              AND shared_with_user_id = $2
              AND is_active = TRUE
              AND revoked_at IS NULL
              AND accepted_at IS NOT NULL
              AND (expires_at IS NULL OR expires_at > $3)
            "#,
        )
        .bind(device_id)
        .bind(user_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(self.storage.get_pool())
        .await?;

        Ok(share)
    }

    pub async fn find_valid_location_share(
        &self,
        location_id: i32,
        user_id: i32,
    ) -> Result<Option<LocationShare>, Error> {
        let share: Option<LocationShare> = sqlx::query_as(
            r#"
            SELECT * FROM location_shares
            WHERE location_id = $1
              AND shared_with_user_id = $2
              AND is_active = TRUE
              AND revoked_at IS NULL
              AND accepted_at IS NOT NULL
              AND (expires_at IS NULL OR expires_at > $3)
            "#,
        )
        .bind(location_id)
        .bind(user_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(self.storage.get_pool())
        .await?;

        Ok(share)
    }
}
