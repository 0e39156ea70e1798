use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};
use time::{Date, OffsetDateTime};

use crate::configs::Storage;
use crate::models::PlantDailyLog;

pub struct DailyLogRepository {
    storage: Arc<Storage>,
}

impl DailyLogRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub async fn find_by_plant_and_date(
        &self,
        plant_id: i32,
        log_date: Date,
    ) -> Result<Option<PlantDailyLog>, Error> {
        let log: Option<PlantDailyLog> =
            sqlx::query_as("SELECT * FROM plant_daily_logs WHERE plant_id = $1 AND log_date = $2")
                .bind(plant_id)
                .bind(log_date)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(log)
    }

    /// Loads the (plant, date) row inside the report transaction, creating
    /// an empty one when this is the first data for that day. The unique
    /// key on (plant_id, log_date) keeps this a single row forever.
    pub async fn fetch_or_create_in(
        &self,
        plant_id: i32,
        log_date: Date,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<PlantDailyLog, Error> {
        let existing: Option<PlantDailyLog> =
            sqlx::query_as("SELECT * FROM plant_daily_logs WHERE plant_id = $1 AND log_date = $2")
                .bind(plant_id)
                .bind(log_date)
                .fetch_optional(&mut **transaction)
                .await?;

        if let Some(log) = existing {
            return Ok(log);
        }

        let now = OffsetDateTime::now_utc();
        let created: PlantDailyLog = sqlx::query_as(
            r#"
            INSERT INTO plant_daily_logs (plant_id, log_date, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING *
            "#,
        )
        .bind(plant_id)
        .bind(log_date)
        .bind(now)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(created)
    }

    /// Writes every aggregate column back. The row was read in the same
    /// transaction; per-report atomicity is the only guarantee offered.
    pub async fn save_in(
        &self,
        log: &PlantDailyLog,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE plant_daily_logs SET
                ph_min = $1, ph_max = $2, ph_avg = $3,
                ec_min = $4, ec_max = $5, ec_avg = $6,
                tds_min = $7, tds_max = $8, tds_avg = $9,
                water_temp_min = $10, water_temp_max = $11, water_temp_avg = $12,
                total_ph_up_ml = $13, total_ph_down_ml = $14, dosing_events_count = $15,
                co2_min = $16, co2_max = $17, co2_avg = $18,
                air_temp_min = $19, air_temp_max = $20, air_temp_avg = $21,
                humidity_min = $22, humidity_max = $23, humidity_avg = $24,
                vpd_min = $25, vpd_max = $26, vpd_avg = $27,
                total_light_seconds = $28, light_cycles_count = $29,
                longest_light_period_seconds = $30, shortest_light_period_seconds = $31,
                hydro_device_id = $32, env_device_id = $33,
                last_hydro_reading = $34, last_env_reading = $35,
                readings_count = $36, updated_at = $37
            WHERE id = $38
            "#,
        )
        .bind(log.ph_min)
        .bind(log.ph_max)
        .bind(log.ph_avg)
        .bind(log.ec_min)
        .bind(log.ec_max)
        .bind(log.ec_avg)
        .bind(log.tds_min)
        .bind(log.tds_max)
        .bind(log.tds_avg)
        .bind(log.water_temp_min)
        .bind(log.water_temp_max)
        .bind(log.water_temp_avg)
        .bind(log.total_ph_up_ml)
        .bind(log.total_ph_down_ml)
        .bind(log.dosing_events_count)
        .bind(log.co2_min)
        .bind(log.co2_max)
        .bind(log.co2_avg)
        .bind(log.air_temp_min)
        .bind(log.air_temp_max)
        .bind(log.air_temp_avg)
        .bind(log.humidity_min)
        .bind(log.humidity_max)
        .bind(log.humidity_avg)
        .bind(log.vpd_min)
        .bind(log.vpd_max)
        .bind(log.vpd_avg)
        .bind(log.total_light_seconds)
        .bind(log.light_cycles_count)
        .bind(log.longest_light_period_seconds)
        .bind(log.shortest_light_period_seconds)
        .bind(log.hydro_device_id)
        .bind(log.env_device_id)
        .bind(log.last_hydro_reading)
        .bind(log.last_env_reading)
        .bind(log.readings_count)
        .bind(OffsetDateTime::now_utc())
        .bind(log.id)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }
}
