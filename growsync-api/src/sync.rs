use serde::{Deserialize, Serialize};

use crate::settings::DeviceSettings;

/// Firmware reconciliation outcome attached to device responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct FirmwareUpdateInfo {
    pub update_available: bool,
    pub current_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
    #[serde(default)]
    pub force_update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

impl FirmwareUpdateInfo {
    /// The "nothing to do" answer: echoes the reported version back.
    pub fn up_to_date(current_version: &str, latest_version: Option<String>) -> Self {
        Self {
            update_available: false,
            current_version: current_version.to_string(),
            latest_version,
            firmware_url: None,
            release_notes: None,
            force_update: false,
            file_size: None,
            checksum: None,
        }
    }
}

/// Common response for device check-ins (heartbeat and reading posts):
/// current settings, the device's nightly posting slot, and firmware
/// update instructions when the device reported its version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct DeviceSyncResponse {
    pub settings: DeviceSettings,
    /// Minute offset inside the posting window, when assigned.
    pub posting_slot: Option<i32>,
    pub posting_window_start_hour: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firmware: Option<FirmwareUpdateInfo>,
}

/// High-frequency environment heartbeat payload. Held only in the live
/// cache for dashboards; history is built from daily reports instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct EnvironmentReading {
    pub co2: Option<i64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub vpd: Option<f64>,
    pub pressure: Option<f64>,
    pub altitude: Option<f64>,
    pub gas_resistance: Option<f64>,
    pub air_quality_score: Option<i64>,
    pub lux: Option<f64>,
    pub ppfd: Option<f64>,
    pub timestamp: String,
    pub firmware_version: Option<String>,
}

/// Read-side projection of the live cache for dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct LatestEnvironmentResponse {
    pub device_id: String,
    pub has_data: bool,
    pub is_online: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<EnvironmentReading>,
}

/// Acknowledgement for an ingested daily report or reading batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct ReportAccepted {
    pub status: String,
    pub plants_updated: usize,
}
