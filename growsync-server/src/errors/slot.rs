use axum::http::StatusCode;

/// Allocator misuse is a caller error, kept distinct from transient
/// failures so callers do not retry blindly.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("Device not found")]
    DeviceNotFound,

    #[error("Device type does not need a posting slot")]
    TypeNotEligible,

    #[error("Device already has a posting slot")]
    AlreadyAssigned,

    #[error("Posting window hours must satisfy 0 <= start < end <= 23")]
    InvalidWindow,
}

impl SlotError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SlotError::DeviceNotFound => StatusCode::NOT_FOUND,
            SlotError::TypeNotEligible => StatusCode::BAD_REQUEST,
            SlotError::AlreadyAssigned => StatusCode::CONFLICT,
            SlotError::InvalidWindow => StatusCode::BAD_REQUEST,
        }
    }
}
