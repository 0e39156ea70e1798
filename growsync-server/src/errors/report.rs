use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Invalid report date: {0}")]
    InvalidDate(String),

    #[error("Daily reports are not supported for this device type")]
    UnsupportedDeviceType,

    #[error("Report type does not match device type")]
    ReportTypeMismatch,
}

impl ReportError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReportError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            ReportError::UnsupportedDeviceType => StatusCode::BAD_REQUEST,
            ReportError::ReportTypeMismatch => StatusCode::BAD_REQUEST,
        }
    }
}
