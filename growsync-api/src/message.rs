use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Control frames the server originates on the relay channels. Everything
/// else on those channels is relayed verbatim and never passes through
/// these types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Presence notification to viewers.
    DeviceStatus { online: bool },
    /// Ask the device to push its complete state to the viewers.
    RequestFullSync,
    /// First dashboard viewer attached.
    UserConnected,
    /// Last dashboard viewer detached.
    UserDisconnected,
    /// A forced firmware update is pending for this device.
    FirmwareUpdate,
}

/// Owner details pushed to a device right after it connects, so it can
/// display who it is paired to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub command: String,
    pub owner_email: String,
    pub owner_name: String,
}

impl ServerInfo {
    pub fn new(owner_email: &str) -> Self {
        let owner_name = owner_email
            .split('@')
            .next()
            .unwrap_or(owner_email)
            .to_string();

        Self {
            command: "server_info".to_string(),
            owner_email: owner_email.to_string(),
            owner_name,
        }
    }
}

/// Self-reported metadata a device sends as `{"type": "device_info", ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfoReport {
    pub device_type: Option<String>,
    pub firmware_version: Option<String>,
    pub capabilities: Option<Value>,
}

/// A device's view of its peer connections, sent as
/// `{"type": "connections", "connections": [...]}`; replaces the stored
/// connection-graph edges for that device.
#[derive(Debug, Clone, Deserialize)]
pub struct PeerConnectionsReport {
    pub connections: Vec<String>,
}
