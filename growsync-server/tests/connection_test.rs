use std::sync::Arc;

use axum::extract::ws::Message as WsMessage;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use growsync_server::handles::{
    WsState, end_device_session, handle_device_frame, start_device_session,
};
use growsync_server::repositories::{
    DeviceLinkRepository, DeviceRepository, FirmwareRepository, ShareRepository, UserRepository,
};
use growsync_server::services::{ConnectionService, FirmwareService, ShareService};

mod common;
use common::mock_app::MockApp;

fn ws_state(app: &MockApp) -> WsState {
    WsState {
        storage: app.storage.clone(),
        connection_service: Arc::new(ConnectionService::new()),
        device_repository: Arc::new(DeviceRepository::new(app.storage.clone())),
        device_link_repository: Arc::new(DeviceLinkRepository::new(app.storage.clone())),
        user_repository: Arc::new(UserRepository::new(app.storage.clone())),
        share_service: Arc::new(ShareService::new(Arc::new(ShareRepository::new(
            app.storage.clone(),
        )))),
        firmware_service: Arc::new(FirmwareService::new(Arc::new(FirmwareRepository::new(
            app.storage.clone(),
        )))),
        token_service: app.token_service.clone(),
    }
}

fn next_json(rx: &mut mpsc::UnboundedReceiver<WsMessage>) -> Option<Value> {
    match rx.try_recv() {
        Ok(WsMessage::Text(text)) => serde_json::from_str(&text).ok(),
        _ => None,
    }
}

async fn is_online(app: &MockApp, device_pk: i32) -> bool {
    sqlx::query_scalar("SELECT is_online FROM devices WHERE id = $1")
        .bind(device_pk)
        .fetch_one(app.storage.get_pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn device_lifecycle_notifies_viewers_even_on_abnormal_exit() {
    let app = MockApp::new().await;
    let state = ws_state(&app);
    let device = app
        .create_test_device("relay-d1", "hydro_controller", app.admin.id, None)
        .await;

    let (viewer_a_tx, mut viewer_a_rx) = mpsc::unbounded_channel();
    let (viewer_b_tx, mut viewer_b_rx) = mpsc::unbounded_channel();
    state
        .connection_service
        .attach_viewer("relay-d1", viewer_a_tx)
        .await;
    state
        .connection_service
        .attach_viewer("relay-d1", viewer_b_tx)
        .await;

    let (device_tx, mut device_rx) = mpsc::unbounded_channel();
    start_device_session(&state, &device, device_tx)
        .await
        .unwrap();

    // Persisted online state and the registry agree, and the device got
    // its owner info frame.
    assert!(is_online(&app, device.id).await);
    assert!(state.connection_service.is_device_connected("relay-d1").await);

    let server_info = next_json(&mut device_rx).unwrap();
    assert_eq!(server_info["command"], json!("server_info"));
    assert_eq!(server_info["owner_email"], json!("admin@growsync.test"));
    assert_eq!(server_info["owner_name"], json!("admin"));

    for viewer_rx in [&mut viewer_a_rx, &mut viewer_b_rx] {
        let status = next_json(viewer_rx).unwrap();
        assert_eq!(status["type"], json!("device_status"));
        assert_eq!(status["online"], json!(true));
    }

    // Device frames relay verbatim to every viewer.
    state
        .connection_service
        .broadcast_to_viewers("relay-d1", WsMessage::Text(json!({"ph": 6.1}).to_string()))
        .await;
    assert_eq!(next_json(&mut viewer_a_rx).unwrap()["ph"], json!(6.1));
    assert_eq!(next_json(&mut viewer_b_rx).unwrap()["ph"], json!(6.1));

    // The session finalizer runs on every exit path, graceful or not: the
    // registry entry goes away, storage flips offline, and both viewers
    // hear about it.
    end_device_session(&state, &device).await;

    assert!(!state.connection_service.is_device_connected("relay-d1").await);
    assert!(!is_online(&app, device.id).await);

    for viewer_rx in [&mut viewer_a_rx, &mut viewer_b_rx] {
        let status = next_json(viewer_rx).unwrap();
        assert_eq!(status["type"], json!("device_status"));
        assert_eq!(status["online"], json!(false));
    }
}

#[tokio::test]
async fn pending_force_update_is_pushed_on_connect() {
    let app = MockApp::new().await;
    let state = ws_state(&app);

    let device = app
        .create_test_device("relay-d2", "hydroponic_controller", app.admin.id, None)
        .await;
    let firmware = app
        .create_test_firmware("hydroponic_controller", "2.1.0", true)
        .await;
    app.assign_firmware(device.id, firmware.id, true).await;

    let (device_tx, mut device_rx) = mpsc::unbounded_channel();
    start_device_session(&state, &device, device_tx)
        .await
        .unwrap();

    let server_info = next_json(&mut device_rx).unwrap();
    assert_eq!(server_info["command"], json!("server_info"));

    let push = next_json(&mut device_rx).unwrap();
    assert_eq!(push["type"], json!("firmware_update"));

    end_device_session(&state, &device).await;
}

#[tokio::test]
async fn device_info_frames_persist_reported_metadata() {
    let app = MockApp::new().await;
    let state = ws_state(&app);
    let device = app
        .create_test_device("relay-d3", "feeding_system", app.admin.id, None)
        .await;

    let frame = json!({
        "type": "device_info",
        "device_type": "environmental",
        "capabilities": {"sensors": ["co2", "lux"]}
    })
    .to_string();
    handle_device_frame(&state, &device, &frame).await;

    let (device_type, scope, capabilities): (String, String, Option<String>) =
        sqlx::query_as("SELECT device_type, scope, capabilities FROM devices WHERE id = $1")
            .bind(device.id)
            .fetch_one(app.storage.get_pool())
            .await
            .unwrap();

    assert_eq!(device_type, "environmental");
    assert_eq!(scope, "room");
    assert!(capabilities.unwrap().contains("co2"));

    // A full_sync payload carries the device's self-chosen name.
    let frame = json!({
        "type": "full_sync",
        "data": {"settings": {"system_name": "Tent Controller"}}
    })
    .to_string();
    handle_device_frame(&state, &device, &frame).await;

    let system_name: Option<String> =
        sqlx::query_scalar("SELECT system_name FROM devices WHERE id = $1")
            .bind(device.id)
            .fetch_one(app.storage.get_pool())
            .await
            .unwrap();
    assert_eq!(system_name.as_deref(), Some("Tent Controller"));
}

#[tokio::test]
async fn peer_connection_reports_replace_link_edges() {
    let app = MockApp::new().await;
    let state = ws_state(&app);

    let device = app
        .create_test_device("relay-d4", "hydro_controller", app.admin.id, None)
        .await;
    let peer_a = app
        .create_test_device("peer-a", "valve_controller", app.admin.id, None)
        .await;
    let peer_b = app
        .create_test_device("peer-b", "valve_controller", app.admin.id, None)
        .await;

    let frame = json!({"type": "connections", "connections": ["peer-a", "ghost-peer"]}).to_string();
    handle_device_frame(&state, &device, &frame).await;

    let links = state
        .device_link_repository
        .find_active_by_source(device.id)
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target_device_id, peer_a.id);

    // A later report replaces the edge set wholesale; the old edge is
    // soft-deleted, not removed.
    let frame = json!({"type": "connections", "connections": ["peer-b"]}).to_string();
    handle_device_frame(&state, &device, &frame).await;

    let links = state
        .device_link_repository
        .find_active_by_source(device.id)
        .await
        .unwrap();
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].target_device_id, peer_b.id);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM device_links WHERE source_device_id = $1")
        .bind(device.id)
        .fetch_one(app.storage.get_pool())
        .await
        .unwrap();
    assert_eq!(total, 2);
}

#[tokio::test]
async fn relay_to_offline_device_reports_failure() {
    let app = MockApp::new().await;
    let state = ws_state(&app);

    let delivered = state
        .connection_service
        .send_to_device("nowhere", WsMessage::Text(json!({"cmd": "ping"}).to_string()))
        .await;

    assert!(!delivered);
}
