use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::post;
use axum::{Json, Router};
use growsync_api::{DailyReport, DeviceSyncResponse, HydroReadingBatch, ReportAccepted};

use crate::errors::{ApiError, DeviceError};
use crate::handles::device_handle::{ApiKeyQuery, build_sync_response};
use crate::repositories::DeviceRepository;
use crate::services::{FirmwareService, IngestService, PostingSlotService};

#[derive(Clone)]
pub struct ReportState {
    pub device_repository: Arc<DeviceRepository>,
    pub ingest_service: Arc<IngestService>,
    pub posting_slot_service: Arc<PostingSlotService>,
    pub firmware_service: Arc<FirmwareService>,
}

pub fn report_router(report_state: ReportState) -> Router {
    Router::new()
        .route(
            "/api/devices/:device_id/hydro/readings",
            post(post_hydro_readings),
        )
        .route(
            "/api/devices/:device_id/daily-report",
            post(post_daily_report),
        )
        .with_state(report_state)
}

#[utoipa::path(
    post,
    path = "/api/devices/{device_id}/hydro/readings",
    tag = "report",
    params(
        ("device_id" = String, Path, description = "External device identifier"),
        ("api_key" = String, Query, description = "Device API key")
    ),
    request_body = HydroReadingBatch,
    responses(
        (status = 200, description = "Readings folded into the daily rollups", body = DeviceSyncResponse),
        (status = 400, description = "Not a hydro controller"),
        (status = 404, description = "Unknown device/api_key pair")
    )
)]
pub async fn post_hydro_readings(
    State(state): State<ReportState>,
    Path(device_id): Path<String>,
    Query(query): Query<ApiKeyQuery>,
    Json(batch): Json<HydroReadingBatch>,
) -> Result<Json<DeviceSyncResponse>, ApiError> {
    let device = state
        .device_repository
        .find_by_credentials(&device_id, &query.api_key)
        .await?
        .ok_or(DeviceError::InvalidCredentials)?;

    state.device_repository.mark_online(device.id).await?;

    let plants_updated = state
        .ingest_service
        .apply_hydro_readings(&device, &batch.readings)
        .await?;

    tracing::debug!(
        "device {} posted {} readings, {} plant(s) updated",
        device.device_id,
        batch.readings.len(),
        plants_updated
    );

    let response = build_sync_response(
        &device,
        batch.firmware_version.as_deref(),
        &state.device_repository,
        &state.posting_slot_service,
        &state.firmware_service,
    )
    .await?;

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/devices/{device_id}/daily-report",
    tag = "report",
    params(
        ("device_id" = String, Path, description = "External device identifier"),
        ("api_key" = String, Query, description = "Device API key")
    ),
    request_body = DailyReport,
    responses(
        (status = 200, description = "Report chunk ingested", body = ReportAccepted),
        (status = 400, description = "Invalid date or unsupported device type"),
        (status = 404, description = "Unknown device/api_key pair")
    )
)]
pub async fn post_daily_report(
    State(state): State<ReportState>,
    Path(device_id): Path<String>,
    Query(query): Query<ApiKeyQuery>,
    Json(report): Json<DailyReport>,
) -> Result<Json<ReportAccepted>, ApiError> {
    let device = state
        .device_repository
        .find_by_credentials(&device_id, &query.api_key)
        .await?
        .ok_or(DeviceError::InvalidCredentials)?;

    let plants_updated = state
        .ingest_service
        .apply_daily_report(&device, &report)
        .await?;

    Ok(Json(ReportAccepted {
        status: "success".to_string(),
        plants_updated,
    }))
}
