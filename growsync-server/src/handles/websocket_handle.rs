use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum_extra::TypedHeader;
use axum_extra::headers::Cookie;
use futures::{SinkExt, StreamExt};
use growsync_api::{ControlMessage, DeviceInfoReport, PeerConnectionsReport, ServerInfo};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::configs::Storage;
use crate::errors::{ApiError, AuthError, DeviceError};
use crate::handles::device_handle::ApiKeyQuery;
use crate::models::Device;
use crate::repositories::{DeviceLinkRepository, DeviceRepository, UserRepository};
use crate::services::{ConnectionService, FirmwareService, ShareService, TokenService};

/// Cookie carrying the viewer's session token; never a query-string
/// secret.
const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct WsState {
    pub storage: Arc<Storage>,
    pub connection_service: Arc<ConnectionService>,
    pub device_repository: Arc<DeviceRepository>,
    pub device_link_repository: Arc<DeviceLinkRepository>,
    pub user_repository: Arc<UserRepository>,
    pub share_service: Arc<ShareService>,
    pub firmware_service: Arc<FirmwareService>,
    pub token_service: Arc<TokenService>,
}

pub fn websocket_router(state: WsState) -> Router {
    Router::new()
        .route("/ws/devices/:device_id", get(device_ws_handler))
        .route("/ws/user/devices/:device_id", get(viewer_ws_handler))
        .with_state(state)
}

/// Device-side channel. Credentials are checked before the upgrade, so an
/// unknown (device_id, api_key) pair never reaches the relay.
async fn device_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
    Path(device_id): Path<String>,
    Query(query): Query<ApiKeyQuery>,
) -> Response {
    let device = match state
        .device_repository
        .find_by_credentials(&device_id, &query.api_key)
        .await
    {
        Ok(Some(device)) => device,
        Ok(None) => {
            tracing::warn!("rejected device socket for {}: invalid credentials", device_id);
            return ApiError::from(DeviceError::InvalidCredentials).into_response();
        }
        Err(error) => return ApiError::from(error).into_response(),
    };

    ws.on_upgrade(move |socket| handle_device_socket(socket, state, device))
}

/// Brings a freshly-authenticated device socket online. The persisted
/// online mark must land before the registry entry; a device the database
/// believes is offline must never be relayed to, so a failed write aborts
/// the session.
pub async fn start_device_session(
    state: &WsState,
    device: &Device,
    device_tx: mpsc::UnboundedSender<WsMessage>,
) -> Result<(), sqlx::Error> {
    state.device_repository.mark_online(device.id).await?;

    state
        .connection_service
        .register_device(&device.device_id, device_tx.clone())
        .await;

    tracing::info!("device {} connected", device.device_id);

    // Owner info so the controller can display who it is paired to.
    match state.user_repository.find_by_id(device.user_id).await {
        Ok(Some(owner)) => {
            if let Ok(frame) = serde_json::to_string(&ServerInfo::new(&owner.email)) {
                let _ = device_tx.send(WsMessage::Text(frame));
            }
        }
        Ok(None) => {}
        Err(error) => {
            tracing::warn!("owner lookup failed for {}: {}", device.device_id, error);
        }
    }

    state
        .connection_service
        .notify_device_status(&device.device_id, true)
        .await;

    match state.firmware_service.pending_push(device).await {
        Ok(true) => {
            if let Ok(frame) = serde_json::to_string(&ControlMessage::FirmwareUpdate) {
                let _ = device_tx.send(WsMessage::Text(frame));
                tracing::info!(
                    "sent pending firmware_update to {} on connect",
                    device.device_id
                );
            }
        }
        Ok(false) => {}
        Err(error) => {
            tracing::warn!(
                "pending firmware check failed for {}: {}",
                device.device_id,
                error
            );
        }
    }

    Ok(())
}

/// Guaranteed finalizer for a device session: runs on clean close,
/// protocol error, and every abnormal exit, so a device can never stay
/// stuck online. The offline mark is best effort; the registry entry goes
/// away regardless.
pub async fn end_device_session(state: &WsState, device: &Device) {
    state
        .connection_service
        .remove_device(&device.device_id)
        .await;

    if let Err(error) = state.device_repository.mark_offline(device.id).await {
        tracing::error!(
            "failed to mark device {} offline: {}",
            device.device_id,
            error
        );
    }

    state
        .connection_service
        .notify_device_status(&device.device_id, false)
        .await;

    tracing::info!("device {} disconnected", device.device_id);
}

async fn handle_device_socket(socket: WebSocket, state: WsState, device: Device) {
    let device_id = device.device_id.clone();
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (device_tx, mut device_rx) = mpsc::unbounded_channel::<WsMessage>();

    if let Err(error) = start_device_session(&state, &device, device_tx).await {
        tracing::error!("failed to mark device {} online: {}", device_id, error);
        return;
    }

    let forward_device_id = device_id.clone();
    let forward_task = tokio::spawn(async move {
        while let Some(message) = device_rx.recv().await {
            if ws_sender.send(message).await.is_err() {
                break;
            }
        }
        tracing::debug!("device {} send task ended", forward_device_id);
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(WsMessage::Text(text)) => {
                // Side effects first, then verbatim relay; a bad payload
                // must never take the relay down.
                handle_device_frame(&state, &device, &text).await;

                state
                    .connection_service
                    .broadcast_to_viewers(&device_id, WsMessage::Text(text))
                    .await;
            }
            Ok(WsMessage::Close(_)) => {
                tracing::info!("device {} closed its socket", device_id);
                break;
            }
            Err(error) => {
                tracing::warn!("device {} socket error: {}", device_id, error);
                break;
            }
            _ => {}
        }
    }

    forward_task.abort();
    end_device_session(&state, &device).await;
}

/// Inspects an inbound device frame for persistence side effects. Every
/// branch tolerates failure; the relay itself never depends on this.
pub async fn handle_device_frame(state: &WsState, device: &Device, text: &str) {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        tracing::warn!("unparseable frame from device {}", device.device_id);
        return;
    };

    match value.get("type").and_then(Value::as_str) {
        Some("device_info") => {
            let Ok(info) = serde_json::from_value::<DeviceInfoReport>(value.clone()) else {
                return;
            };

            if let Some(device_type) = &info.device_type {
                let scope = Device::scope_for_type(device_type);
                if let Err(error) = state
                    .device_repository
                    .update_reported_type(device.id, device_type, scope)
                    .await
                {
                    tracing::warn!("type update failed for {}: {}", device.device_id, error);
                } else {
                    tracing::info!(
                        "auto-detected device type for {}: {}",
                        device.device_id,
                        device_type
                    );
                }
            }

            if let Some(capabilities) = &info.capabilities {
                if let Ok(blob) = serde_json::to_string(capabilities) {
                    if let Err(error) = state
                        .device_repository
                        .update_capabilities(device.id, &blob)
                        .await
                    {
                        tracing::warn!(
                            "capabilities update failed for {}: {}",
                            device.device_id,
                            error
                        );
                    }
                }
            }
        }
        Some("connections") => {
            let Ok(report) = serde_json::from_value::<PeerConnectionsReport>(value.clone()) else {
                return;
            };

            if let Err(error) = replace_peer_links(state, device, &report).await {
                tracing::warn!("peer link update failed for {}: {}", device.device_id, error);
            }
        }
        _ => {
            persist_system_name(state, device, &value).await;
        }
    }
}

/// `full_sync` payloads (and any frame carrying a `data` object) may embed
/// the device's self-chosen system name; keep the stored copy current.
async fn persist_system_name(state: &WsState, device: &Device, value: &Value) {
    let is_full_sync = value.get("type").and_then(Value::as_str) == Some("full_sync");
    if !is_full_sync && value.get("data").is_none() {
        return;
    }

    let payload = value.get("data").unwrap_or(value);
    let Some(system_name) = payload
        .get("settings")
        .and_then(|settings| settings.get("system_name"))
        .and_then(Value::as_str)
    else {
        return;
    };

    if device.system_name.as_deref() == Some(system_name) {
        return;
    }

    match state
        .device_repository
        .update_system_name(device.id, system_name)
        .await
    {
        Ok(()) => {
            tracing::info!("updated system_name for {}: {}", device.device_id, system_name);
        }
        Err(error) => {
            tracing::warn!("system_name update failed for {}: {}", device.device_id, error);
        }
    }
}

/// Replaces the device's outbound connection-graph edges with the reported
/// peer set, soft-delete then recreate, in one transaction. Peers that do
/// not resolve to known devices are skipped.
async fn replace_peer_links(
    state: &WsState,
    device: &Device,
    report: &PeerConnectionsReport,
) -> Result<(), ApiError> {
    let mut target_ids = Vec::with_capacity(report.connections.len());

    for peer_external_id in &report.connections {
        match state
            .device_repository
            .find_by_external_id(peer_external_id)
            .await?
        {
            Some(peer) => target_ids.push(peer.id),
            None => {
                tracing::warn!(
                    "device {} reported unknown peer {}",
                    device.device_id,
                    peer_external_id
                );
            }
        }
    }

    let mut transaction = state.storage.get_pool().begin().await?;
    state
        .device_link_repository
        .replace_links_in(device.id, &target_ids, &mut transaction)
        .await?;
    transaction.commit().await?;

    tracing::info!(
        "replaced {} peer link(s) for device {}",
        target_ids.len(),
        device.device_id
    );

    Ok(())
}

/// Viewer-side channel: session token from a cookie, authorization by
/// ownership or a currently-valid share.
async fn viewer_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
    Path(device_id): Path<String>,
    cookie: Option<TypedHeader<Cookie>>,
) -> Response {
    let token = cookie
        .as_ref()
        .and_then(|TypedHeader(cookie)| cookie.get(AUTH_COOKIE));

    let Some(token) = token else {
        return ApiError::from(AuthError::MissingCredentials).into_response();
    };

    let claims = match state.token_service.retrieve_token_claims(token) {
        Ok(data) => data.claims,
        Err(_) => return ApiError::from(AuthError::InvalidToken).into_response(),
    };

    let Some(user_id) = claims.user_id() else {
        return ApiError::from(AuthError::InvalidToken).into_response();
    };

    let user = match state.user_repository.find_active_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return ApiError::from(AuthError::UserNotActive).into_response(),
        Err(error) => return ApiError::from(error).into_response(),
    };

    let device = match state.device_repository.find_by_external_id(&device_id).await {
        Ok(Some(device)) => device,
        Ok(None) => return ApiError::from(DeviceError::DeviceNotFound).into_response(),
        Err(error) => return ApiError::from(error).into_response(),
    };

    match state.share_service.can_view_device(&user, &device).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(
                "viewer auth failed: device {} not owned or shared with user {}",
                device_id,
                user_id
            );
            return ApiError::from(AuthError::AccessDenied).into_response();
        }
        Err(error) => return ApiError::from(error).into_response(),
    }

    ws.on_upgrade(move |socket| handle_viewer_socket(socket, state, device))
}

async fn handle_viewer_socket(socket: WebSocket, state: WsState, device: Device) {
    let device_id = device.device_id.clone();
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (viewer_tx, mut viewer_rx) = mpsc::unbounded_channel::<WsMessage>();

    let (viewer_id, viewer_count) = state
        .connection_service
        .attach_viewer(&device_id, viewer_tx.clone())
        .await;

    tracing::info!("viewer {} attached to device {}", viewer_id, device_id);

    let forward_task = tokio::spawn(async move {
        while let Some(message) = viewer_rx.recv().await {
            if ws_sender.send(message).await.is_err() {
                break;
            }
        }
    });

    // A freshly-attached dashboard wants full state; the very first viewer
    // additionally flips the device into attended mode.
    if state.connection_service.is_device_connected(&device_id).await {
        send_control(&state, &device_id, &ControlMessage::RequestFullSync).await;

        if viewer_count == 1 {
            send_control(&state, &device_id, &ControlMessage::UserConnected).await;
        }
    }

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(WsMessage::Text(text)) => {
                let delivered = state
                    .connection_service
                    .send_to_device(&device_id, WsMessage::Text(text))
                    .await;

                if !delivered {
                    let frame = json!({"error": "Device offline"}).to_string();
                    let _ = viewer_tx.send(WsMessage::Text(frame));
                }
            }
            Ok(WsMessage::Close(_)) => break,
            Err(error) => {
                tracing::warn!("viewer {} socket error: {}", viewer_id, error);
                break;
            }
            _ => {}
        }
    }

    forward_task.abort();
    let remaining = state
        .connection_service
        .detach_viewer(&device_id, viewer_id)
        .await;

    if remaining == 0 {
        send_control(&state, &device_id, &ControlMessage::UserDisconnected).await;
    }

    tracing::info!("viewer {} detached from device {}", viewer_id, device_id);
}

async fn send_control(state: &WsState, device_id: &str, message: &ControlMessage) {
    if let Ok(frame) = serde_json::to_string(message) {
        state
            .connection_service
            .send_to_device(device_id, WsMessage::Text(frame))
            .await;
    }
}
