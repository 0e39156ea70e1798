use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router, middleware};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiError, AuthError, DeviceError};
use crate::middlewares::{TokenState, auth};
use crate::repositories::DeviceRepository;
use crate::services::{PostingSlotService, PostingWindow, RebalanceSummary, TokenClaims};

#[derive(Clone)]
pub struct SlotState {
    pub device_repository: Arc<DeviceRepository>,
    pub posting_slot_service: Arc<PostingSlotService>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostingWindowUpdate {
    pub posting_window_start_hour: u8,
    pub posting_window_end_hour: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceSlotResponse {
    pub device_id: String,
    pub assigned_minute: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotRemovedResponse {
    pub device_id: String,
    pub removed: bool,
}

pub fn slot_router(slot_state: SlotState, token_state: TokenState) -> Router {
    Router::new()
        .route(
            "/api/config/posting-window",
            get(get_posting_window).post(update_posting_window),
        )
        .route("/api/posting-slots/rebalance", post(rebalance_slots))
        .route(
            "/api/devices/:device_id/posting-slot",
            get(get_device_slot).delete(remove_device_slot),
        )
        .route_layer(middleware::from_fn_with_state(token_state, auth))
        .with_state(slot_state)
}

fn require_admin(token_data: &TokenClaims) -> Result<(), ApiError> {
    if token_data.is_admin() {
        Ok(())
    } else {
        Err(AuthError::AdminRequired.into())
    }
}

pub async fn get_posting_window(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<SlotState>,
) -> Result<Json<PostingWindow>, ApiError> {
    require_admin(&token_data)?;

    Ok(Json(state.posting_slot_service.config().window().await))
}

/// Changing the window only affects future allocations and rebalances;
/// existing assignments stay where they are.
pub async fn update_posting_window(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<SlotState>,
    Json(body): Json<PostingWindowUpdate>,
) -> Result<Json<PostingWindow>, ApiError> {
    require_admin(&token_data)?;

    state
        .posting_slot_service
        .config()
        .set_window(body.posting_window_start_hour, body.posting_window_end_hour)
        .await?;

    Ok(Json(state.posting_slot_service.config().window().await))
}

pub async fn rebalance_slots(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<SlotState>,
) -> Result<Json<RebalanceSummary>, ApiError> {
    require_admin(&token_data)?;

    let summary = state.posting_slot_service.rebalance_all().await?;

    Ok(Json(summary))
}

pub async fn get_device_slot(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<SlotState>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceSlotResponse>, ApiError> {
    require_admin(&token_data)?;

    let device = state
        .device_repository
        .find_by_external_id(&device_id)
        .await?
        .ok_or(DeviceError::DeviceNotFound)?;

    let assigned_minute = state.posting_slot_service.get_slot(device.id).await?;

    Ok(Json(DeviceSlotResponse {
        device_id,
        assigned_minute,
    }))
}

pub async fn remove_device_slot(
    Extension(token_data): Extension<TokenClaims>,
    State(state): State<SlotState>,
    Path(device_id): Path<String>,
) -> Result<Json<SlotRemovedResponse>, ApiError> {
    require_admin(&token_data)?;

    let device = state
        .device_repository
        .find_by_external_id(&device_id)
        .await?
        .ok_or(DeviceError::DeviceNotFound)?;

    let removed = state.posting_slot_service.remove_slot(device.id).await?;

    Ok(Json(SlotRemovedResponse { device_id, removed }))
}
