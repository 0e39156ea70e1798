use std::sync::Arc;

use sqlx::Error;

use crate::models::{Device, User};
use crate::repositories::ShareRepository;

/// Read-side authorization for viewer access to a device: ownership, a
/// valid device share, or a valid share of the device's location. Share
/// management itself lives outside this subsystem.
pub struct ShareService {
    share_repository: Arc<ShareRepository>,
}

impl ShareService {
    pub fn new(share_repository: Arc<ShareRepository>) -> Self {
        Self { share_repository }
    }

    pub async fn can_view_device(&self, user: &User, device: &Device) -> Result<bool, Error> {
        if device.user_id == user.id {
            return Ok(true);
        }

        if self
            .share_repository
            .find_valid_device_share(device.id, user.id)
            .await?
            .is_some()
        {
            return Ok(true);
        }

        if let Some(location_id) = device.location_id {
            if self
                .share_repository
                .find_valid_location_share(location_id, user.id)
                .await?
                .is_some()
            {
                return Ok(true);
            }
        }

        Ok(false)
    }
}
