use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::models::Table;

/// The per-plant-per-day rollup. One row per (plant_id, log_date); every
/// sensor family keeps a (min, max, avg) triple that is folded
/// incrementally as readings and report chunks arrive.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlantDailyLog {
    pub id: i32,
    pub plant_id: i32,
    pub log_date: Date,

    pub ph_min: Option<f64>,
    pub ph_max: Option<f64>,
    pub ph_avg: Option<f64>,
    pub ec_min: Option<f64>,
    pub ec_max: Option<f64>,
    pub ec_avg: Option<f64>,
    pub tds_min: Option<f64>,
    pub tds_max: Option<f64>,
    pub tds_avg: Option<f64>,
    pub water_temp_min: Option<f64>,
    pub water_temp_max: Option<f64>,
    pub water_temp_avg: Option<f64>,

    pub total_ph_up_ml: f64,
    pub total_ph_down_ml: f64,
    pub dosing_events_count: i32,

    pub co2_min: Option<f64>,
    pub co2_max: Option<f64>,
    pub co2_avg: Option<f64>,
    pub air_temp_min: Option<f64>,
    pub air_temp_max: Option<f64>,
    pub air_temp_avg: Option<f64>,
    pub humidity_min: Option<f64>,
    pub humidity_max: Option<f64>,
    pub humidity_avg: Option<f64>,
    pub vpd_min: Option<f64>,
    pub vpd_max: Option<f64>,
    pub vpd_avg: Option<f64>,

    pub total_light_seconds: Option<i64>,
    pub light_cycles_count: Option<i32>,
    pub longest_light_period_seconds: Option<i64>,
    pub shortest_light_period_seconds: Option<i64>,

    pub hydro_device_id: Option<i32>,
    pub env_device_id: Option<i32>,
    pub last_hydro_reading: Option<OffsetDateTime>,
    pub last_env_reading: Option<OffsetDateTime>,
    pub readings_count: i32,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Clone)]
pub struct PlantDailyLogTable;

impl Table for PlantDailyLogTable {
    fn name(&self) -> &'static str {
        "plant_daily_logs"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS plant_daily_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plant_id INTEGER NOT NULL,
                log_date DATE NOT NULL,

                ph_min REAL,
                ph_max REAL,
                ph_avg REAL,
                ec_min REAL,
                ec_max REAL,
                ec_avg REAL,
                tds_min REAL,
                tds_max REAL,
                tds_avg REAL,
                water_temp_min REAL,
                water_temp_max REAL,
                water_temp_avg REAL,

                total_ph_up_ml REAL NOT NULL DEFAULT 0.0,
                total_ph_down_ml REAL NOT NULL DEFAULT 0.0,
                dosing_events_count INTEGER NOT NULL DEFAULT 0,

                co2_min REAL,
                co2_max REAL,
                co2_avg REAL,
                air_temp_min REAL,
                air_temp_max REAL,
                air_temp_avg REAL,
                humidity_min REAL,
                humidity_max REAL,
                humidity_avg REAL,
                vpd_min REAL,
                vpd_max REAL,
                vpd_avg REAL,

                total_light_seconds INTEGER,
                light_cycles_count INTEGER,
                longest_light_period_seconds INTEGER,
                shortest_light_period_seconds INTEGER,

                hydro_device_id INTEGER,
                env_device_id INTEGER,
                last_hydro_reading DATETIME,
                last_env_reading DATETIME,
                readings_count INTEGER NOT NULL DEFAULT 0,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,

                UNIQUE (plant_id, log_date),
                FOREIGN KEY (plant_id) REFERENCES plants (id) ON DELETE CASCADE,
                FOREIGN KEY (hydro_device_id) REFERENCES devices (id) ON DELETE SET NULL,
                FOREIGN KEY (env_device_id) REFERENCES devices (id) ON DELETE SET NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS plant_daily_logs;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec!["plants", "devices"]
    }
}
