use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};
use time::{Date, OffsetDateTime};

use crate::configs::Storage;

pub struct EventRepository {
    #[allow(dead_code)]
    storage: Arc<Storage>,
}

impl EventRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Inserts one dosing occurrence; returns false when the natural key
    /// (plant, timestamp, type) already exists — a replayed chunk.
    pub async fn insert_dosing_in(
        &self,
        plant_id: i32,
        device_id: i32,
        timestamp: OffsetDateTime,
        dosing_type: &str,
        amount_ml: f64,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO dosing_events
                (plant_id, device_id, event_date, timestamp, dosing_type, amount_ml, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(plant_id)
        .bind(device_id)
        .bind(timestamp.date())
        .bind(timestamp)
        .bind(dosing_type)
        .bind(amount_ml)
        .bind(OffsetDateTime::now_utc())
        .execute(&mut **transaction)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Inserts one lights-ON period; returns false on a replayed
    /// (plant, start_time) pair.
    pub async fn insert_light_in(
        &self,
        plant_id: i32,
        device_id: i32,
        event_date: Date,
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
        duration_seconds: i64,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO light_events
                (plant_id, device_id, event_date, start_time, end_time, duration_seconds, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(plant_id)
        .bind(device_id)
        .bind(event_date)
        .bind(start_time)
        .bind(end_time)
        .bind(duration_seconds)
        .bind(OffsetDateTime::now_utc())
        .execute(&mut **transaction)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
