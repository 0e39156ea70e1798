use super::{AuthError, DeviceError, FirmwareError, ReportError, SlotError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),

    #[error("Posting slot error: {0}")]
    SlotError(#[from] SlotError),

    #[error("Report error: {0}")]
    ReportError(#[from] ReportError),

    #[error("Firmware error: {0}")]
    FirmwareError(#[from] FirmwareError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
