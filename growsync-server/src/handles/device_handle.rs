use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, patch, post};
use axum::{Extension, Json, Router, middleware};
use growsync_api::{
    DeviceSettings, DeviceSettingsUpdate, DeviceSyncResponse, EnvironmentReading,
    LatestEnvironmentResponse,
};
use serde::Deserialize;
use time::format_description::well_known::Rfc3339;

use crate::errors::{ApiError, AuthError, DeviceError};
use crate::middlewares::{TokenState, auth};
use crate::models::Device;
use crate::repositories::{DeviceRepository, UserRepository};
use crate::services::{
    FirmwareService, LiveCacheService, PostingSlotService, ShareService, TokenClaims,
};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: String,
}

#[derive(Clone)]
pub struct DeviceState {
    pub device_repository: Arc<DeviceRepository>,
    pub user_repository: Arc<UserRepository>,
    pub posting_slot_service: Arc<PostingSlotService>,
    pub firmware_service: Arc<FirmwareService>,
    pub share_service: Arc<ShareService>,
    pub live_cache: Arc<LiveCacheService>,
}

pub fn device_router(device_state: DeviceState, token_state: TokenState) -> Router {
    let device_facing = Router::new()
        .route(
            "/api/devices/:device_id/environment",
            post(post_environment_heartbeat),
        )
        .route(
            "/api/devices/:device_id/settings",
            patch(update_device_settings),
        )
        .with_state(device_state.clone());

    let user_facing = Router::new()
        .route(
            "/api/devices/:device_id/environment/latest",
            get(get_latest_environment),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(device_state);

    device_facing.merge(user_facing)
}

/// Builds the shared check-in response: current settings (delivering and
/// clearing any pending one-shot reboot), the lazily-ensured posting slot,
/// and firmware instructions when the device reported its version.
pub async fn build_sync_response(
    device: &Device,
    reported_firmware: Option<&str>,
    device_repository: &DeviceRepository,
    posting_slot_service: &PostingSlotService,
    firmware_service: &FirmwareService,
) -> Result<DeviceSyncResponse, ApiError> {
    // The returned blob keeps pending_reboot as read, so the device sees
    // the one-shot exactly once; only the stored copy is cleared.
    let settings = DeviceSettings::from_stored(device.settings.as_deref());

    if settings.pending_reboot {
        let mut cleared = settings.clone();
        cleared.pending_reboot = false;
        device_repository
            .update_settings(device.id, &cleared.to_stored())
            .await?;

        tracing::info!(
            "delivered pending reboot to device {}, flag cleared",
            device.device_id
        );
    }

    let posting_slot = posting_slot_service.ensure_slot(device).await?;
    let window = posting_slot_service.config().window().await;

    let firmware = match reported_firmware {
        Some(current_version) => Some(firmware_service.check_update(device, current_version).await?),
        None => None,
    };

    Ok(DeviceSyncResponse {
        settings,
        posting_slot,
        posting_window_start_hour: window.start_hour,
        firmware,
    })
}

#[utoipa::path(
    post,
    path = "/api/devices/{device_id}/environment",
    tag = "device",
    params(
        ("device_id" = String, Path, description = "External device identifier"),
        ("api_key" = String, Query, description = "Device API key")
    ),
    request_body = EnvironmentReading,
    responses(
        (status = 200, description = "Heartbeat accepted", body = DeviceSyncResponse),
        (status = 400, description = "Not an environmental sensor"),
        (status = 404, description = "Unknown device/api_key pair")
    )
)]
pub async fn post_environment_heartbeat(
    State(state): State<DeviceState>,
    Path(device_id): Path<String>,
    Query(query): Query<ApiKeyQuery>,
    Json(reading): Json<EnvironmentReading>,
) -> Result<Json<DeviceSyncResponse>, ApiError> {
    let device = state
        .device_repository
        .find_by_credentials(&device_id, &query.api_key)
        .await?
        .ok_or(DeviceError::InvalidCredentials)?;

    if !device.is_environmental() {
        return Err(DeviceError::NotEnvironmental.into());
    }

    state.device_repository.mark_online(device.id).await?;

    // Heartbeat readings feed the dashboard cache only; history is built
    // from the nightly daily reports.
    let reported_firmware = reading.firmware_version.clone();
    state.live_cache.update(device.id, reading).await;

    let response = build_sync_response(
        &device,
        reported_firmware.as_deref(),
        &state.device_repository,
        &state.posting_slot_service,
        &state.firmware_service,
    )
    .await?;

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/devices/{device_id}/environment/latest",
    tag = "device",
    params(
        ("device_id" = String, Path, description = "External device identifier")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Latest cached reading", body = LatestEnvironmentResponse),
        (status = 403, description = "No ownership or valid share"),
        (status = 404, description = "Device not found")
    )
)]
pub async fn get_latest_environment(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<DeviceState>,
    Path(device_id): Path<String>,
) -> Result<Json<LatestEnvironmentResponse>, ApiError> {
    let user_id = token_data.user_id().ok_or(AuthError::InvalidToken)?;
    let user = state
        .user_repository
        .find_active_by_id(user_id)
        .await?
        .ok_or(AuthError::UserNotActive)?;

    let device = state
        .device_repository
        .find_by_external_id(&device_id)
        .await?
        .ok_or(DeviceError::DeviceNotFound)?;

    if !state.share_service.can_view_device(&user, &device).await? {
        return Err(AuthError::AccessDenied.into());
    }

    let reading = state.live_cache.latest(device.id).await;

    Ok(Json(LatestEnvironmentResponse {
        device_id,
        has_data: reading.is_some(),
        is_online: device.is_online,
        last_seen: device
            .last_seen
            .and_then(|last_seen| last_seen.format(&Rfc3339).ok()),
        reading,
    }))
}

pub async fn update_device_settings(
    State(state): State<DeviceState>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<DeviceSettingsUpdate>,
) -> Result<Json<DeviceSettings>, ApiError> {
    let api_key = headers
        .get("X-API-Key")
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let device = state
        .device_repository
        .find_by_credentials(&device_id, api_key)
        .await?
        .ok_or(DeviceError::InvalidCredentials)?;

    let mut settings = DeviceSettings::from_stored(device.settings.as_deref());
    body.apply_to(&mut settings);

    state
        .device_repository
        .update_settings(device.id, &settings.to_stored())
        .await?;

    Ok(Json(settings))
}
