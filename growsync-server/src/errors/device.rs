use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Unknown (device_id, api_key) pair; the device must re-pair.
    #[error("Device not found - please re-pair")]
    InvalidCredentials,

    #[error("Device not found")]
    DeviceNotFound,

    #[error("This endpoint is only for environmental sensors")]
    NotEnvironmental,

    #[error("This endpoint is only for hydro controllers")]
    NotHydroController,

    #[error("Invalid request parameters")]
    InvalidRequest,

    #[error("Insufficient permission")]
    InsufficientPermission,
}

impl DeviceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DeviceError::InvalidCredentials => StatusCode::NOT_FOUND,
            DeviceError::DeviceNotFound => StatusCode::NOT_FOUND,
            DeviceError::NotEnvironmental => StatusCode::BAD_REQUEST,
            DeviceError::NotHydroController => StatusCode::BAD_REQUEST,
            DeviceError::InvalidRequest => StatusCode::BAD_REQUEST,
            DeviceError::InsufficientPermission => StatusCode::FORBIDDEN,
        }
    }
}
