use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use growsync_api::FirmwareUpdateInfo;
use serde::Deserialize;

use crate::errors::{ApiError, FirmwareError};
use crate::repositories::DeviceRepository;
use crate::services::FirmwareService;

#[derive(Clone)]
pub struct FirmwareState {
    pub device_repository: Arc<DeviceRepository>,
    pub firmware_service: Arc<FirmwareService>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirmwareCheckQuery {
    pub current_version: String,
}

pub fn firmware_router(firmware_state: FirmwareState) -> Router {
    Router::new()
        .route("/api/firmware/check/:device_id", get(check_firmware_update))
        .with_state(firmware_state)
}

/// Standalone update check; the same reconciliation also rides along on
/// the heartbeat/readings responses.
pub async fn check_firmware_update(
    State(state): State<FirmwareState>,
    Path(device_id): Path<String>,
    Query(query): Query<FirmwareCheckQuery>,
) -> Result<Json<FirmwareUpdateInfo>, ApiError> {
    let device = state
        .device_repository
        .find_by_external_id(&device_id)
        .await?
        .ok_or(FirmwareError::DeviceNotFound)?;

    let info = state
        .firmware_service
        .check_update(&device, &query.current_version)
        .await?;

    Ok(Json(info))
}
