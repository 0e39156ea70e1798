use std::sync::Arc;

use growsync_api::FirmwareUpdateInfo;
use sqlx::Error;

use crate::models::Device;
use crate::repositories::FirmwareRepository;

/// Decides whether a device is due a firmware update, from its reported
/// version and the assignment/latest-version records.
pub struct FirmwareService {
    firmware_repository: Arc<FirmwareRepository>,
}

impl FirmwareService {
    pub fn new(firmware_repository: Arc<FirmwareRepository>) -> Self {
        Self { firmware_repository }
    }

    /// An explicit per-device assignment always wins over the type's
    /// `is_latest` row. The force flag is one-shot: it is captured into the
    /// response while it still matters, and cleared once the device reports
    /// the assigned version.
    pub async fn check_update(
        &self,
        device: &Device,
        current_version: &str,
    ) -> Result<FirmwareUpdateInfo, Error> {
        if let Some(assignment) = self
            .firmware_repository
            .find_assignment_for_device(device.id)
            .await?
        {
            let Some(firmware) = self
                .firmware_repository
                .find_by_id(assignment.firmware_id)
                .await?
            else {
                // Dangling assignment; fall back to echoing the version.
                tracing::warn!(
                    "firmware assignment {} references missing firmware {}",
                    assignment.id,
                    assignment.firmware_id
                );
                return Ok(FirmwareUpdateInfo::up_to_date(current_version, None));
            };

            if firmware.version != current_version {
                return Ok(FirmwareUpdateInfo {
                    update_available: true,
                    current_version: current_version.to_string(),
                    latest_version: Some(firmware.version.clone()),
                    firmware_url: Some(firmware.download_url()),
                    release_notes: firmware.release_notes.clone(),
                    force_update: assignment.force_update,
                    file_size: firmware.file_size,
                    checksum: firmware.checksum.clone(),
                });
            }

            if assignment.force_update {
                self.firmware_repository
                    .clear_force_flag(assignment.id)
                    .await?;

                tracing::info!(
                    "cleared force_update flag for device {} - now at v{}",
                    device.device_id,
                    current_version
                );
            }

            return Ok(FirmwareUpdateInfo::up_to_date(
                current_version,
                Some(firmware.version),
            ));
        }

        let Some(latest) = self
            .firmware_repository
            .find_latest_for_type(&device.device_type)
            .await?
        else {
            return Ok(FirmwareUpdateInfo::up_to_date(current_version, None));
        };

        if latest.version != current_version {
            return Ok(FirmwareUpdateInfo {
                update_available: true,
                current_version: current_version.to_string(),
                latest_version: Some(latest.version.clone()),
                firmware_url: Some(latest.download_url()),
                release_notes: latest.release_notes.clone(),
                force_update: false,
                file_size: latest.file_size,
                checksum: latest.checksum.clone(),
            });
        }

        Ok(FirmwareUpdateInfo::up_to_date(
            current_version,
            Some(latest.version),
        ))
    }

    /// Whether to push a `firmware_update` command when the device
    /// connects. Only ESP-based types handle the push channel.
    pub async fn pending_push(&self, device: &Device) -> Result<bool, Error> {
        if !device.accepts_firmware_push() {
            return Ok(false);
        }

        self.firmware_repository.has_pending_force(device.id).await
    }
}
