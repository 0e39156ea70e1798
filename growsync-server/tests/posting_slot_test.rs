use std::collections::HashSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use growsync_server::configs::settings::Posting;
use growsync_server::errors::{ApiError, SlotError};
use growsync_server::repositories::{DeviceRepository, PostingSlotRepository};
use growsync_server::services::{PostingConfig, PostingSlotService};

mod common;
use common::mock_app::MockApp;

fn slot_service(app: &MockApp) -> PostingSlotService {
    let config = Arc::new(PostingConfig::new(&Posting {
        window_start_hour: 1,
        window_end_hour: 6,
    }));

    PostingSlotService::new(
        app.storage.clone(),
        Arc::new(DeviceRepository::new(app.storage.clone())),
        Arc::new(PostingSlotRepository::new(app.storage.clone())),
        config,
    )
}

#[tokio::test]
async fn sequential_assignments_stay_unique_and_in_window() {
    let app = MockApp::new().await;
    let service = slot_service(&app);

    let mut minutes = Vec::new();
    for ordinal in 0..8 {
        let device = app
            .create_test_device(
                &format!("hydro-{ordinal}"),
                "hydro_controller",
                app.admin.id,
                None,
            )
            .await;

        minutes.push(service.assign_slot(&device).await.unwrap());
    }

    let distinct: HashSet<i32> = minutes.iter().copied().collect();
    assert_eq!(distinct.len(), minutes.len(), "slots must be pairwise distinct");
    assert!(minutes.iter().all(|minute| (0..300).contains(minute)));
}

#[tokio::test]
async fn third_device_bisects_largest_gap() {
    let app = MockApp::new().await;
    let service = slot_service(&app);

    let first = app
        .create_test_device("env-a", "environmental", app.admin.id, None)
        .await;
    let second = app
        .create_test_device("env-b", "environmental", app.admin.id, None)
        .await;
    let third = app
        .create_test_device("env-c", "environmental", app.admin.id, None)
        .await;

    assert_eq!(service.assign_slot(&first).await.unwrap(), 0);
    assert_eq!(service.assign_slot(&second).await.unwrap(), 150);

    // Move the second slot to 100 to reproduce the {0, 100} layout.
    sqlx::query("UPDATE device_posting_slots SET assigned_minute = 100 WHERE device_id = $1")
        .bind(second.id)
        .execute(app.storage.get_pool())
        .await
        .unwrap();

    // Gaps in a 300-minute window: before-first 0, between 100, after-last
    // 200 -> bisect the trailing gap.
    assert_eq!(service.assign_slot(&third).await.unwrap(), 200);
}

#[tokio::test]
async fn allocator_misuse_is_a_caller_error() {
    let app = MockApp::new().await;
    let service = slot_service(&app);

    let valve = app
        .create_test_device("valve-1", "valve_controller", app.admin.id, None)
        .await;
    assert!(matches!(
        service.assign_slot(&valve).await,
        Err(ApiError::SlotError(SlotError::TypeNotEligible))
    ));

    let hydro = app
        .create_test_device("hydro-1", "hydro_controller", app.admin.id, None)
        .await;
    service.assign_slot(&hydro).await.unwrap();
    assert!(matches!(
        service.assign_slot(&hydro).await,
        Err(ApiError::SlotError(SlotError::AlreadyAssigned))
    ));
}

#[tokio::test]
async fn rebalance_spreads_devices_evenly_and_drops_stale_rows() {
    let app = MockApp::new().await;
    let service = slot_service(&app);

    for ordinal in 0..7 {
        let device = app
            .create_test_device(
                &format!("hydro-{ordinal}"),
                "hydro_controller",
                app.admin.id,
                None,
            )
            .await;
        service.assign_slot(&device).await.unwrap();
    }

    // A stale slot row for a device type that no longer qualifies must not
    // survive the rebalance.
    let valve = app
        .create_test_device("valve-9", "valve_controller", app.admin.id, None)
        .await;
    sqlx::query(
        "INSERT INTO device_posting_slots (device_id, assigned_minute, created_at, updated_at)
         VALUES ($1, 7, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
    )
    .bind(valve.id)
    .execute(app.storage.get_pool())
    .await
    .unwrap();

    let summary = service.rebalance_all().await.unwrap();
    assert_eq!(summary.devices_count, 7);
    assert_eq!(summary.window_duration, 300);

    let expected: Vec<i32> = (0..7).map(|ordinal| ordinal * 300 / 7).collect();
    let assigned: Vec<i32> = summary
        .assignments
        .iter()
        .map(|assignment| assignment.assigned_minute)
        .collect();
    assert_eq!(assigned, expected);

    let stale: i64 =
        sqlx::query_scalar("SELECT COUNT(id) FROM device_posting_slots WHERE device_id = $1")
            .bind(valve.id)
            .fetch_one(app.storage.get_pool())
            .await
            .unwrap();
    assert_eq!(stale, 0);

    let total: i64 = sqlx::query_scalar("SELECT COUNT(id) FROM device_posting_slots")
        .fetch_one(app.storage.get_pool())
        .await
        .unwrap();
    assert_eq!(total, 7);
}

#[tokio::test]
async fn window_change_applies_to_future_allocations_only() {
    let app = MockApp::new().await;
    let service = slot_service(&app);

    let first = app
        .create_test_device("env-1", "environmental", app.admin.id, None)
        .await;
    let second = app
        .create_test_device("env-2", "environmental", app.admin.id, None)
        .await;
    let third = app
        .create_test_device("env-3", "environmental", app.admin.id, None)
        .await;

    assert_eq!(service.assign_slot(&first).await.unwrap(), 0);
    assert_eq!(service.assign_slot(&second).await.unwrap(), 150);

    // Widen the window at runtime; existing slots stay put, the next
    // allocation scans gaps against the new duration (600 minutes).
    service.config().set_window(0, 10).await.unwrap();
    assert_eq!(service.assign_slot(&third).await.unwrap(), 375);

    assert!(matches!(
        service.config().set_window(6, 6).await,
        Err(SlotError::InvalidWindow)
    ));
}

#[tokio::test]
async fn admin_endpoints_manage_window_and_rebalance() {
    let app = MockApp::new().await;

    let request = Request::builder()
        .uri("/api/config/posting-window")
        .method(Method::POST)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", app.admin_token))
        .body(Body::from(
            json!({
                "posting_window_start_hour": 2,
                "posting_window_end_hour": 7
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let window: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(window["start_hour"], json!(2));
    assert_eq!(window["end_hour"], json!(7));

    let request = Request::builder()
        .uri("/api/posting-slots/rebalance")
        .method(Method::POST)
        .header("Authorization", format!("Bearer {}", app.admin_token))
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Regular users cannot touch scheduling.
    let grower = app.create_test_user("grower@growsync.test").await;
    let grower_token = app.user_token(&grower).await;

    let request = Request::builder()
        .uri("/api/posting-slots/rebalance")
        .method(Method::POST)
        .header("Authorization", format!("Bearer {grower_token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
