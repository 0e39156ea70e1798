pub mod message;
pub mod report;
pub mod settings;
pub mod sync;

pub use message::{ControlMessage, DeviceInfoReport, PeerConnectionsReport, ServerInfo};
pub use report::{
    DailyReport, DosingEventPayload, EnvironmentDailyReport, HydroDailyReport, HydroReading,
    HydroReadingBatch, LightEventPayload, StatSummary,
};
pub use settings::{DeviceSettings, DeviceSettingsUpdate};
pub use sync::{
    DeviceSyncResponse, EnvironmentReading, FirmwareUpdateInfo, LatestEnvironmentResponse,
    ReportAccepted,
};
