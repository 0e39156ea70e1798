use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum FirmwareError {
    #[error("Device not found")]
    DeviceNotFound,

    #[error("Firmware not found")]
    FirmwareNotFound,
}

impl FirmwareError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FirmwareError::DeviceNotFound => StatusCode::NOT_FOUND,
            FirmwareError::FirmwareNotFound => StatusCode::NOT_FOUND,
        }
    }
}
