use std::collections::BTreeMap;
use std::sync::Arc;

use growsync_api::{
    DailyReport, EnvironmentDailyReport, HydroDailyReport, HydroReading, LightEventPayload,
};
use sqlx::{Sqlite, Transaction};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::configs::Storage;
use crate::errors::{ApiError, DeviceError, ReportError};
use crate::models::{Device, Plant};
use crate::repositories::{DailyLogRepository, EventRepository, PlantRepository};
use crate::services::accumulator::{Aggregate, LightTotals};

const REPORT_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Applies device reports to the per-plant daily rollups: resolves which
/// plants a device's data fans out to, folds values through the
/// accumulator, and appends the per-occurrence event records — one
/// transaction per report.
pub struct IngestService {
    storage: Arc<Storage>,
    plant_repository: Arc<PlantRepository>,
    daily_log_repository: Arc<DailyLogRepository>,
    event_repository: Arc<EventRepository>,
}

impl IngestService {
    pub fn new(
        storage: Arc<Storage>,
        plant_repository: Arc<PlantRepository>,
        daily_log_repository: Arc<DailyLogRepository>,
        event_repository: Arc<EventRepository>,
    ) -> Self {
        Self {
            storage,
            plant_repository,
            daily_log_repository,
            event_repository,
        }
    }

    /// Which plants receive this device's data. Hydro controllers feed
    /// their actively-assigned plants; a room-scoped environmental sensor
    /// fans out to every active plant in its location, and one without a
    /// location feeds nothing (a no-op, not an error).
    pub async fn resolve_target_plants(&self, device: &Device) -> Result<Vec<Plant>, ApiError> {
        if device.is_hydro_controller() {
            return Ok(self
                .plant_repository
                .find_active_by_assigned_device(device.id)
                .await?);
        }

        if device.is_environmental() {
            return match device.location_id {
                Some(location_id) => Ok(self
                    .plant_repository
                    .find_active_by_device_location(location_id)
                    .await?),
                None => Ok(Vec::new()),
            };
        }

        Err(ReportError::UnsupportedDeviceType.into())
    }

    /// Ingests one daily-report chunk. Returns how many plants were
    /// updated; zero qualifying plants is a success (the device may be
    /// temporarily unassigned).
    pub async fn apply_daily_report(
        &self,
        device: &Device,
        report: &DailyReport,
    ) -> Result<usize, ApiError> {
        match report {
            DailyReport::Hydro(_) if device.is_hydro_controller() => {}
            DailyReport::Environment(_) if device.is_environmental() => {}
            _ if device.is_hydro_controller() || device.is_environmental() => {
                return Err(ReportError::ReportTypeMismatch.into());
            }
            _ => return Err(ReportError::UnsupportedDeviceType.into()),
        }

        let log_date = parse_report_date(report.date())?;
        let plants = self.resolve_target_plants(device).await?;

        if plants.is_empty() {
            tracing::info!(
                "no active plants resolved for device {}, nothing to ingest",
                device.device_id
            );
            return Ok(0);
        }

        let mut transaction = self.storage.get_pool().begin().await?;

        for plant in &plants {
            match report {
                DailyReport::Hydro(hydro) => {
                    self.apply_hydro_chunk(plant, device, log_date, hydro, &mut transaction)
                        .await?;
                }
                DailyReport::Environment(environment) => {
                    self.apply_environment_chunk(
                        plant,
                        device,
                        log_date,
                        environment,
                        &mut transaction,
                    )
                    .await?;
                }
            }
        }

        transaction.commit().await?;

        tracing::info!(
            "ingested {} daily report for {} plant(s) from device {}",
            report_kind(report),
            plants.len(),
            device.device_id
        );

        Ok(plants.len())
    }

    /// Ingests a fine-grained reading batch from a hydro controller. Each
    /// reading folds through the accumulator individually and counts once
    /// in `readings_count`.
    pub async fn apply_hydro_readings(
        &self,
        device: &Device,
        readings: &[HydroReading],
    ) -> Result<usize, ApiError> {
        if !device.is_hydro_controller() {
            return Err(DeviceError::NotHydroController.into());
        }

        let plants = self
            .plant_repository
            .find_active_by_assigned_device(device.id)
            .await?;

        if plants.is_empty() {
            return Ok(0);
        }

        let mut by_date: BTreeMap<Date, Vec<(OffsetDateTime, &HydroReading)>> = BTreeMap::new();
        for reading in readings {
            match OffsetDateTime::parse(&reading.timestamp, &Rfc3339) {
                Ok(timestamp) => {
                    by_date
                        .entry(timestamp.date())
                        .or_default()
                        .push((timestamp, reading));
                }
                Err(error) => {
                    tracing::warn!(
                        "skipping reading with unparseable timestamp {:?} from {}: {}",
                        reading.timestamp,
                        device.device_id,
                        error
                    );
                }
            }
        }

        if by_date.is_empty() {
            return Ok(0);
        }

        let mut transaction = self.storage.get_pool().begin().await?;

        for plant in &plants {
            for (log_date, group) in &by_date {
                let mut log = self
                    .daily_log_repository
                    .fetch_or_create_in(plant.id, *log_date, &mut transaction)
                    .await?;

                let seed = log.readings_count as i64;
                let mut ph = Aggregate::from_parts(log.ph_min, log.ph_max, log.ph_avg, seed);
                let mut ec = Aggregate::from_parts(log.ec_min, log.ec_max, log.ec_avg, seed);
                let mut tds = Aggregate::from_parts(log.tds_min, log.tds_max, log.tds_avg, seed);
                let mut water_temp = Aggregate::from_parts(
                    log.water_temp_min,
                    log.water_temp_max,
                    log.water_temp_avg,
                    seed,
                );
                let mut air_temp = Aggregate::from_parts(
                    log.air_temp_min,
                    log.air_temp_max,
                    log.air_temp_avg,
                    seed,
                );

                let mut last_reading = log.last_hydro_reading;
                for (timestamp, reading) in group {
                    ph = ph.fold_opt(reading.ph);
                    ec = ec.fold_opt(reading.ec);
                    tds = tds.fold_opt(reading.tds);
                    water_temp = water_temp.fold_opt(reading.water_temp);
                    air_temp = air_temp.fold_opt(reading.air_temp);

                    last_reading = Some(last_reading.map_or(*timestamp, |seen| seen.max(*timestamp)));
                    log.readings_count += 1;
                }

                (log.ph_min, log.ph_max, log.ph_avg) = (ph.min, ph.max, ph.avg);
                (log.ec_min, log.ec_max, log.ec_avg) = (ec.min, ec.max, ec.avg);
                (log.tds_min, log.tds_max, log.tds_avg) = (tds.min, tds.max, tds.avg);
                (log.water_temp_min, log.water_temp_max, log.water_temp_avg) =
                    (water_temp.min, water_temp.max, water_temp.avg);
                (log.air_temp_min, log.air_temp_max, log.air_temp_avg) =
                    (air_temp.min, air_temp.max, air_temp.avg);

                log.hydro_device_id = Some(device.id);
                log.last_hydro_reading = last_reading;

                self.daily_log_repository
                    .save_in(&log, &mut transaction)
                    .await?;
            }
        }

        transaction.commit().await?;

        Ok(plants.len())
    }

    async fn apply_hydro_chunk(
        &self,
        plant: &Plant,
        device: &Device,
        log_date: Date,
        report: &HydroDailyReport,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), ApiError> {
        let mut log = self
            .daily_log_repository
            .fetch_or_create_in(plant.id, log_date, transaction)
            .await?;

        let seed = log.readings_count as i64;

        let ph = Aggregate::from_parts(log.ph_min, log.ph_max, log.ph_avg, seed)
            .merge_chunk(report.ph);
        (log.ph_min, log.ph_max, log.ph_avg) = (ph.min, ph.max, ph.avg);

        let ec = Aggregate::from_parts(log.ec_min, log.ec_max, log.ec_avg, seed)
            .merge_chunk(report.ec);
        (log.ec_min, log.ec_max, log.ec_avg) = (ec.min, ec.max, ec.avg);

        let tds = Aggregate::from_parts(log.tds_min, log.tds_max, log.tds_avg, seed)
            .merge_chunk(report.tds);
        (log.tds_min, log.tds_max, log.tds_avg) = (tds.min, tds.max, tds.avg);

        let water_temp =
            Aggregate::from_parts(log.water_temp_min, log.water_temp_max, log.water_temp_avg, seed)
                .merge_chunk(report.water_temp);
        (log.water_temp_min, log.water_temp_max, log.water_temp_avg) =
            (water_temp.min, water_temp.max, water_temp.avg);

        let air_temp =
            Aggregate::from_parts(log.air_temp_min, log.air_temp_max, log.air_temp_avg, seed)
                .merge_chunk(report.air_temp);
        (log.air_temp_min, log.air_temp_max, log.air_temp_avg) =
            (air_temp.min, air_temp.max, air_temp.avg);

        for event in &report.dosing_events {
            if !event.amount_ml.is_finite() || event.amount_ml < 0.0 {
                tracing::warn!(
                    "skipping dosing event with invalid amount {} from {}",
                    event.amount_ml,
                    device.device_id
                );
                continue;
            }

            let timestamp = match OffsetDateTime::parse(&event.timestamp, &Rfc3339) {
                Ok(timestamp) => timestamp,
                Err(error) => {
                    tracing::warn!(
                        "skipping dosing event with unparseable timestamp {:?} from {}: {}",
                        event.timestamp,
                        device.device_id,
                        error
                    );
                    continue;
                }
            };

            let inserted = self
                .event_repository
                .insert_dosing_in(
                    plant.id,
                    device.id,
                    timestamp,
                    &event.dosing_type,
                    event.amount_ml,
                    transaction,
                )
                .await?;

            // Totals only move for rows that actually landed, so replayed
            // chunks cannot double-count.
            if inserted {
                match event.dosing_type.as_str() {
                    "ph_up" => log.total_ph_up_ml += event.amount_ml,
                    "ph_down" => log.total_ph_down_ml += event.amount_ml,
                    _ => {}
                }
                log.dosing_events_count += 1;
            }
        }

        log.hydro_device_id = Some(device.id);
        log.last_hydro_reading = Some(OffsetDateTime::now_utc());
        log.readings_count += 1;

        self.daily_log_repository.save_in(&log, transaction).await?;

        Ok(())
    }

    async fn apply_environment_chunk(
        &self,
        plant: &Plant,
        device: &Device,
        log_date: Date,
        report: &EnvironmentDailyReport,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), ApiError> {
        let mut log = self
            .daily_log_repository
            .fetch_or_create_in(plant.id, log_date, transaction)
            .await?;

        let seed = log.readings_count as i64;

        let co2 = Aggregate::from_parts(log.co2_min, log.co2_max, log.co2_avg, seed)
            .merge_chunk(report.co2);
        (log.co2_min, log.co2_max, log.co2_avg) = (co2.min, co2.max, co2.avg);

        let air_temp =
            Aggregate::from_parts(log.air_temp_min, log.air_temp_max, log.air_temp_avg, seed)
                .merge_chunk(report.air_temp);
        (log.air_temp_min, log.air_temp_max, log.air_temp_avg) =
            (air_temp.min, air_temp.max, air_temp.avg);

        let humidity =
            Aggregate::from_parts(log.humidity_min, log.humidity_max, log.humidity_avg, seed)
                .merge_chunk(report.humidity);
        (log.humidity_min, log.humidity_max, log.humidity_avg) =
            (humidity.min, humidity.max, humidity.avg);

        let vpd = Aggregate::from_parts(log.vpd_min, log.vpd_max, log.vpd_avg, seed)
            .merge_chunk(report.vpd);
        (log.vpd_min, log.vpd_max, log.vpd_avg) = (vpd.min, vpd.max, vpd.avg);

        let mut totals = LightTotals::from_parts(
            log.total_light_seconds,
            log.light_cycles_count,
            log.longest_light_period_seconds,
            log.shortest_light_period_seconds,
        );

        for event in &report.light_events {
            let Some((start_time, end_time, duration_seconds)) =
                parse_light_event(event, &device.device_id)
            else {
                continue;
            };

            let inserted = self
                .event_repository
                .insert_light_in(
                    plant.id,
                    device.id,
                    log_date,
                    start_time,
                    end_time,
                    duration_seconds,
                    transaction,
                )
                .await?;

            if inserted {
                totals.add_period(duration_seconds);
            }
        }

        log.total_light_seconds = Some(totals.total_seconds);
        log.light_cycles_count = Some(totals.cycles);
        log.longest_light_period_seconds = totals.longest_seconds;
        log.shortest_light_period_seconds = totals.shortest_seconds;

        log.env_device_id = Some(device.id);
        log.last_env_reading = Some(OffsetDateTime::now_utc());
        log.readings_count += 1;

        self.daily_log_repository.save_in(&log, transaction).await?;

        Ok(())
    }
}

fn parse_report_date(date: &str) -> Result<Date, ReportError> {
    Date::parse(date, REPORT_DATE_FORMAT).map_err(|_| ReportError::InvalidDate(date.to_string()))
}

fn report_kind(report: &DailyReport) -> &'static str {
    match report {
        DailyReport::Hydro(_) => "hydro",
        DailyReport::Environment(_) => "environment",
    }
}

/// Validates one light event; malformed events are skipped with a warning
/// rather than failing the report.
fn parse_light_event(
    event: &LightEventPayload,
    device_id: &str,
) -> Option<(OffsetDateTime, OffsetDateTime, i64)> {
    let start_time = match OffsetDateTime::parse(&event.start_time, &Rfc3339) {
        Ok(start_time) => start_time,
        Err(error) => {
            tracing::warn!(
                "skipping light event with unparseable start {:?} from {}: {}",
                event.start_time,
                device_id,
                error
            );
            return None;
        }
    };

    let end_time = match OffsetDateTime::parse(&event.end_time, &Rfc3339) {
        Ok(end_time) => end_time,
        Err(error) => {
            tracing::warn!(
                "skipping light event with unparseable end {:?} from {}: {}",
                event.end_time,
                device_id,
                error
            );
            return None;
        }
    };

    if end_time < start_time {
        tracing::warn!(
            "skipping light event ending before it starts ({} .. {}) from {}",
            event.start_time,
            event.end_time,
            device_id
        );
        return None;
    }

    let duration_seconds = if event.duration_seconds > 0 {
        event.duration_seconds
    } else {
        (end_time - start_time).whole_seconds()
    };

    Some((start_time, end_time, duration_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_date_requires_iso_calendar_form() {
        assert!(parse_report_date("2026-08-05").is_ok());
        assert!(parse_report_date("08/05/2026").is_err());
        assert!(parse_report_date("2026-13-40").is_err());
    }

    #[test]
    fn malformed_light_events_are_skipped() {
        let bad_start = LightEventPayload {
            start_time: "not-a-time".into(),
            end_time: "2026-08-05T18:00:00Z".into(),
            duration_seconds: 3600,
        };
        assert!(parse_light_event(&bad_start, "dev").is_none());

        let inverted = LightEventPayload {
            start_time: "2026-08-05T18:00:00Z".into(),
            end_time: "2026-08-05T06:00:00Z".into(),
            duration_seconds: 0,
        };
        assert!(parse_light_event(&inverted, "dev").is_none());
    }

    #[test]
    fn light_event_duration_falls_back_to_interval() {
        let event = LightEventPayload {
            start_time: "2026-08-05T06:00:00Z".into(),
            end_time: "2026-08-05T18:00:00Z".into(),
            duration_seconds: 0,
        };

        let (_, _, duration) = parse_light_event(&event, "dev").unwrap();
        assert_eq!(duration, 12 * 3600);
    }
}
