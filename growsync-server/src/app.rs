use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::settings::{Auth, Posting};
use crate::configs::{SchemaManager, Settings, Storage};
use crate::handles::{
    DeviceState, FirmwareState, ReportState, SlotState, WsState, device_router, firmware_router,
    report_router, slot_router, websocket_router,
};
use crate::middlewares::TokenState;
use crate::repositories::{
    DailyLogRepository, DeviceLinkRepository, DeviceRepository, EventRepository,
    FirmwareRepository, PlantRepository, PostingSlotRepository, ShareRepository, UserRepository,
};
use crate::services::{
    ConnectionService, FirmwareService, IngestService, LiveCacheService, PostingConfig,
    PostingSlotService, ShareService, TokenService,
};

pub async fn create_app(settings: &Arc<Settings>) -> Router {
    let storage = Arc::new(
        Storage::new(settings.database.clone(), SchemaManager::default())
            .await
            .unwrap(),
    );

    create_router(storage, &settings.auth, &settings.posting)
}

/// Wires repositories, services, and per-handler states onto one router.
/// Collaborators are always passed in explicitly; nothing here is reached
/// through ambient globals.
pub fn create_router(storage: Arc<Storage>, auth: &Auth, posting: &Posting) -> Router {
    let device_repository = Arc::new(DeviceRepository::new(storage.clone()));
    let user_repository = Arc::new(UserRepository::new(storage.clone()));
    let plant_repository = Arc::new(PlantRepository::new(storage.clone()));
    let posting_slot_repository = Arc::new(PostingSlotRepository::new(storage.clone()));
    let daily_log_repository = Arc::new(DailyLogRepository::new(storage.clone()));
    let event_repository = Arc::new(EventRepository::new(storage.clone()));
    let firmware_repository = Arc::new(FirmwareRepository::new(storage.clone()));
    let share_repository = Arc::new(ShareRepository::new(storage.clone()));
    let device_link_repository = Arc::new(DeviceLinkRepository::new(storage.clone()));

    let token_service = Arc::new(TokenService::new(auth.clone()));
    let posting_config = Arc::new(PostingConfig::new(posting));
    let posting_slot_service = Arc::new(PostingSlotService::new(
        storage.clone(),
        device_repository.clone(),
        posting_slot_repository.clone(),
        posting_config.clone(),
    ));
    let connection_service = Arc::new(ConnectionService::new());
    let live_cache = Arc::new(LiveCacheService::new());
    let share_service = Arc::new(ShareService::new(share_repository.clone()));
    let firmware_service = Arc::new(FirmwareService::new(firmware_repository.clone()));
    let ingest_service = Arc::new(IngestService::new(
        storage.clone(),
        plant_repository.clone(),
        daily_log_repository.clone(),
        event_repository.clone(),
    ));

    let token_state = TokenState {
        token_service: token_service.clone(),
        storage: storage.clone(),
    };

    let devices = device_router(
        DeviceState {
            device_repository: device_repository.clone(),
            user_repository: user_repository.clone(),
            posting_slot_service: posting_slot_service.clone(),
            firmware_service: firmware_service.clone(),
            share_service: share_service.clone(),
            live_cache: live_cache.clone(),
        },
        token_state.clone(),
    );

    let reports = report_router(ReportState {
        device_repository: device_repository.clone(),
        ingest_service: ingest_service.clone(),
        posting_slot_service: posting_slot_service.clone(),
        firmware_service: firmware_service.clone(),
    });

    let slots = slot_router(
        SlotState {
            device_repository: device_repository.clone(),
            posting_slot_service: posting_slot_service.clone(),
        },
        token_state.clone(),
    );

    let firmware = firmware_router(FirmwareState {
        device_repository: device_repository.clone(),
        firmware_service: firmware_service.clone(),
    });

    let websockets = websocket_router(WsState {
        storage: storage.clone(),
        connection_service: connection_service.clone(),
        device_repository: device_repository.clone(),
        device_link_repository: device_link_repository.clone(),
        user_repository: user_repository.clone(),
        share_service: share_service.clone(),
        firmware_service: firmware_service.clone(),
        token_service: token_service.clone(),
    });

    Router::new()
        .merge(devices)
        .merge(reports)
        .merge(slots)
        .merge(firmware)
        .merge(websockets)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
