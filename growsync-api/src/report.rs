use serde::{Deserialize, Serialize};

/// A min/max/avg triple for one sensor family, as aggregated on the device
/// for (part of) a day. Any leg may be absent when the device had no
/// readings for that family.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct StatSummary {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

/// One dosing occurrence reported inside a hydro daily report.
///
/// Timestamps travel as RFC 3339 strings; the server parses them and skips
/// events it cannot parse without rejecting the whole report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct DosingEventPayload {
    pub timestamp: String,
    /// `ph_up`, `ph_down`, or a free-form nutrient label.
    pub dosing_type: String,
    pub amount_ml: f64,
}

/// One lights-ON period reported inside an environment daily report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct LightEventPayload {
    pub start_time: String,
    pub end_time: String,
    pub duration_seconds: i64,
}

/// Daily report from a hydro controller: reservoir chemistry plus dosing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct HydroDailyReport {
    /// Calendar date the report covers, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub ph: StatSummary,
    #[serde(default)]
    pub ec: StatSummary,
    #[serde(default)]
    pub tds: StatSummary,
    #[serde(default)]
    pub water_temp: StatSummary,
    #[serde(default)]
    pub air_temp: StatSummary,
    #[serde(default)]
    pub dosing_events: Vec<DosingEventPayload>,
}

/// Daily report from an environmental sensor: air readings plus the
/// light-cycle periods detected from the lux threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct EnvironmentDailyReport {
    /// Calendar date the report covers, `YYYY-MM-DD`.
    pub date: String,
    #[serde(default)]
    pub co2: StatSummary,
    #[serde(default)]
    pub air_temp: StatSummary,
    #[serde(default)]
    pub humidity: StatSummary,
    #[serde(default)]
    pub vpd: StatSummary,
    #[serde(default)]
    pub light_events: Vec<LightEventPayload>,
}

/// The discriminated daily-report union. Devices may split one day into
/// several chunks; totals on the server accumulate across chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[serde(tag = "report_type", rename_all = "snake_case")]
pub enum DailyReport {
    Environment(EnvironmentDailyReport),
    Hydro(HydroDailyReport),
}

impl DailyReport {
    pub fn date(&self) -> &str {
        match self {
            DailyReport::Environment(report) => &report.date,
            DailyReport::Hydro(report) => &report.date,
        }
    }
}

/// A single fine-grained reading from a hydro controller (posted a few
/// times per day between daily reports).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct HydroReading {
    pub timestamp: String,
    pub ph: Option<f64>,
    pub ec: Option<f64>,
    pub tds: Option<f64>,
    pub water_temp: Option<f64>,
    pub air_temp: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
pub struct HydroReadingBatch {
    pub readings: Vec<HydroReading>,
    /// Firmware version the controller is currently running, when it wants
    /// update instructions in the response.
    pub firmware_version: Option<String>,
}
