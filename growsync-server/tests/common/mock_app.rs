use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use time::OffsetDateTime;

use growsync_server::app::create_router;
use growsync_server::configs::schema::SchemaManager;
use growsync_server::configs::settings::{Auth, Database, Posting};
use growsync_server::configs::storage::Storage;
use growsync_server::models::{Device, Firmware, Location, Plant, User};
use growsync_server::services::TokenService;

pub struct MockApp {
    pub storage: Arc<Storage>,
    pub router: Router,
    pub token_service: Arc<TokenService>,
    pub admin: User,
    pub admin_token: String,
}

static NEXT_DB_ID: AtomicUsize = AtomicUsize::new(0);

impl MockApp {
    pub async fn new() -> Self {
        // A named shared-cache memory database keeps every pooled
        // connection on the same schema, and the per-test name keeps
        // parallel tests apart.
        let db_id = NEXT_DB_ID.fetch_add(1, Ordering::Relaxed);

        let storage = Arc::new(
            Storage::new(
                Database {
                    migration_path: None,
                    clean_start: true,
                    url: format!("sqlite:file:mock_app_{db_id}?mode=memory&cache=shared"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        );

        let auth = Auth {
            secret: String::from("test"),
            expiration: 1000,
        };
        let posting = Posting {
            window_start_hour: 1,
            window_end_hour: 6,
        };

        let router = create_router(storage.clone(), &auth, &posting);
        let token_service = Arc::new(TokenService::new(auth));

        let admin: User = sqlx::query_as(
            r#"
            INSERT INTO users (email, password, role, is_active)
                VALUES ('admin@growsync.test', 'not-a-real-hash', 'admin', TRUE)
                RETURNING *;
            "#,
        )
        .fetch_one(storage.get_pool())
        .await
        .unwrap();

        let admin_token = token_service.generate_token(&admin).unwrap().token;

        Self {
            storage,
            router,
            token_service,
            admin,
            admin_token,
        }
    }

    pub async fn create_test_user(&self, email: &str) -> User {
        sqlx::query_as(
            r#"
            INSERT INTO users (email, password, role, is_active)
                VALUES ($1, 'not-a-real-hash', 'user', TRUE)
                RETURNING *;
            "#,
        )
        .bind(email)
        .fetch_one(self.storage.get_pool())
        .await
        .unwrap()
    }

    pub async fn create_test_location(&self, user_id: i32, name: &str) -> Location {
        sqlx::query_as(
            r#"
            INSERT INTO locations (user_id, name)
                VALUES ($1, $2)
                RETURNING *;
            "#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(self.storage.get_pool())
        .await
        .unwrap()
    }

    pub async fn create_test_device(
        &self,
        device_id: &str,
        device_type: &str,
        user_id: i32,
        location_id: Option<i32>,
    ) -> Device {
        let scope = if device_type == "environmental" {
            "room"
        } else {
            "plant"
        };

        sqlx::query_as(
            r#"
            INSERT INTO devices (device_id, api_key, device_type, scope, user_id, location_id)
                VALUES ($1, 'test-api-key', $2, $3, $4, $5)
                RETURNING *;
            "#,
        )
        .bind(device_id)
        .bind(device_type)
        .bind(scope)
        .bind(user_id)
        .bind(location_id)
        .fetch_one(self.storage.get_pool())
        .await
        .unwrap()
    }

    pub async fn create_test_plant(
        &self,
        plant_id: &str,
        user_id: i32,
        location_id: Option<i32>,
    ) -> Plant {
        sqlx::query_as(
            r#"
            INSERT INTO plants (plant_id, name, user_id, location_id, start_date)
                VALUES ($1, 'Test Strain', $2, $3, $4)
                RETURNING *;
            "#,
        )
        .bind(plant_id)
        .bind(user_id)
        .bind(location_id)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.storage.get_pool())
        .await
        .unwrap()
    }

    pub async fn assign_device_to_plant(&self, device_id: i32, plant_id: i32) {
        sqlx::query(
            r#"
            INSERT INTO device_assignments (plant_id, device_id, assigned_at)
                VALUES ($1, $2, $3);
            "#,
        )
        .bind(plant_id)
        .bind(device_id)
        .bind(OffsetDateTime::now_utc())
        .execute(self.storage.get_pool())
        .await
        .unwrap();
    }

    pub async fn create_test_firmware(
        &self,
        device_type: &str,
        version: &str,
        is_latest: bool,
    ) -> Firmware {
        sqlx::query_as(
            r#"
            INSERT INTO firmware
                (device_type, version, release_notes, file_path, file_size, checksum, is_latest, is_prerelease, created_at)
                VALUES ($1, $2, 'Test release', $3, 1048576, 'abc123', $4, FALSE, $5)
                RETURNING *;
            "#,
        )
        .bind(device_type)
        .bind(version)
        .bind(format!("{device_type}/{version}.bin"))
        .bind(is_latest)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.storage.get_pool())
        .await
        .unwrap()
    }

    pub async fn assign_firmware(&self, device_id: i32, firmware_id: i32, force_update: bool) -> i32 {
        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO device_firmware_assignments
                (device_id, firmware_id, force_update, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $4)
                RETURNING id;
            "#,
        )
        .bind(device_id)
        .bind(firmware_id)
        .bind(force_update)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.storage.get_pool())
        .await
        .unwrap();

        id
    }

    pub async fn create_accepted_device_share(&self, device_id: i32, owner_id: i32, user_id: i32) {
        sqlx::query(
            r#"
            INSERT INTO device_shares
                (device_id, owner_user_id, shared_with_user_id, share_code, permission_level,
                 created_at, accepted_at, is_active)
                VALUES ($1, $2, $3, $4, 'viewer', $5, $5, TRUE);
            "#,
        )
        .bind(device_id)
        .bind(owner_id)
        .bind(user_id)
        .bind(format!("SHARE{device_id}X{user_id}"))
        .bind(OffsetDateTime::now_utc())
        .execute(self.storage.get_pool())
        .await
        .unwrap();
    }

    pub async fn user_token(&self, user: &User) -> String {
        self.token_service.generate_token(user).unwrap().token
    }
}
