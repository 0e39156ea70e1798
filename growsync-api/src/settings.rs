use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_update_interval() -> u32 {
    60
}

/// The per-device settings blob, stored as JSON text on the device row.
///
/// Unknown keys are round-tripped through `extra` so older servers never
/// strip fields written by newer firmware.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct DeviceSettings {
    #[serde(default)]
    pub use_fahrenheit: bool,
    /// Heartbeat cadence in seconds.
    #[serde(default = "default_update_interval")]
    pub update_interval: u32,
    /// Legacy logging cadence; kept for round-tripping, unused by the
    /// daily-report flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_interval: Option<u32>,
    /// One-shot reboot request, cleared when delivered to the device.
    #[serde(default)]
    pub pending_reboot: bool,
    /// Lux level separating lights-ON from lights-OFF.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_threshold: Option<f64>,
    #[serde(flatten)]
    #[cfg_attr(feature = "docs", schema(value_type = Object))]
    pub extra: Map<String, Value>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            use_fahrenheit: false,
            update_interval: default_update_interval(),
            log_interval: None,
            pending_reboot: false,
            light_threshold: None,
            extra: Map::new(),
        }
    }
}

impl DeviceSettings {
    /// Parses the stored blob, falling back to defaults on empty or
    /// malformed text. Malformed blobs happened in the field with early
    /// firmware, so this path never errors.
    pub fn from_stored(blob: Option<&str>) -> Self {
        blob.and_then(|text| serde_json::from_str(text).ok())
            .unwrap_or_default()
    }

    pub fn to_stored(&self) -> String {
        serde_json::to_string(self).expect("settings blob serializes")
    }
}

/// Partial settings update from the device's `PATCH` endpoint; absent
/// fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct DeviceSettingsUpdate {
    pub use_fahrenheit: Option<bool>,
    pub update_interval: Option<u32>,
    pub log_interval: Option<u32>,
    pub pending_reboot: Option<bool>,
    pub light_threshold: Option<f64>,
}

impl DeviceSettingsUpdate {
    pub fn apply_to(&self, settings: &mut DeviceSettings) {
        if let Some(use_fahrenheit) = self.use_fahrenheit {
            settings.use_fahrenheit = use_fahrenheit;
        }
        if let Some(update_interval) = self.update_interval {
            settings.update_interval = update_interval;
        }
        if let Some(log_interval) = self.log_interval {
            settings.log_interval = Some(log_interval);
        }
        if let Some(pending_reboot) = self.pending_reboot {
            settings.pending_reboot = pending_reboot;
        }
        if let Some(light_threshold) = self.light_threshold {
            settings.light_threshold = Some(light_threshold);
        }
    }
}
