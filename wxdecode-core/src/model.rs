use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use crate::decoder::{decode_cloud_type, decode_sky_coverage};

/// Structured output of a report parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WeatherReport {
    Metar(MetarReport),
    Taf(TafReport),
}

impl WeatherReport {
    pub fn station_id(&self) -> &str {
        match self {
            WeatherReport::Metar(m) => &m.station_id,
            WeatherReport::Taf(t) => &t.station_id,
        }
    }

    pub fn raw_text(&self) -> &str {
        match self {
            WeatherReport::Metar(m) => &m.raw_text,
            WeatherReport::Taf(t) => &t.raw_text,
        }
    }

    pub fn as_metar(&self) -> Option<&MetarReport> {
        match self {
            WeatherReport::Metar(m) => Some(m),
            WeatherReport::Taf(_) => None,
        }
    }

    pub fn as_taf(&self) -> Option<&TafReport> {
        match self {
            WeatherReport::Taf(t) => Some(t),
            WeatherReport::Metar(_) => None,
        }
    }

    /// One-line human-readable rendering.
    pub fn summary(&self) -> String {
        match self {
            WeatherReport::Metar(m) => {
                let mut out = format!(
                    "{} {} {}",
                    m.report_type,
                    m.station_id,
                    m.observation_time.format("%Y-%m-%d %H:%MZ")
                );
                let conditions = m.conditions.describe();
                if !conditions.is_empty() {
                    let _ = write!(out, ": {conditions}");
                }
                if let Some(t) = &m.temperature {
                    let _ = write!(out, ", temperature {}°C", t.celsius);
                    if let Some(d) = t.dewpoint_celsius {
                        let _ = write!(out, " (dewpoint {d}°C)");
                    }
                }
                if let Some(p) = &m.pressure {
                    let _ = write!(out, ", pressure {p}");
                }
                out
            }
            WeatherReport::Taf(t) => {
                let mut out = format!(
                    "TAF {} issued {}, valid {} to {}",
                    t.station_id,
                    t.issue_time.format("%Y-%m-%d %H:%MZ"),
                    t.validity.start.format("%d %H:%MZ"),
                    t.validity.end.format("%d %H:%MZ"),
                );
                for period in &t.periods {
                    let conditions = period.conditions.describe();
                    let _ = write!(out, "; {}", period.label());
                    if !conditions.is_empty() {
                        let _ = write!(out, ": {conditions}");
                    }
                }
                out
            }
        }
    }
}

/// A decoded METAR or SPECI observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetarReport {
    /// `METAR` or `SPECI`.
    pub report_type: String,
    pub station_id: String,
    /// Issue time from the NOAA date line preceding the report, if present.
    pub issue_time: Option<DateTime<Utc>>,
    pub observation_time: DateTime<Utc>,
    /// AUTO, COR, ...
    pub modifier: Option<String>,
    pub conditions: WeatherConditions,
    pub runway_visual_ranges: Vec<RunwayVisualRange>,
    pub temperature: Option<Temperature>,
    pub pressure: Option<Pressure>,
    pub no_significant_change: bool,
    pub remarks: Option<Remarks>,
    /// Body groups that matched no known pattern.
    pub unparsed: Vec<String>,
    pub raw_text: String,
}

/// A decoded terminal aerodrome forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TafReport {
    pub station_id: String,
    /// AMD or COR.
    pub modifier: Option<String>,
    pub issue_time: DateTime<Utc>,
    pub validity: ValidityPeriod,
    /// Base forecast first, then change groups in report order.
    pub periods: Vec<ForecastPeriod>,
    pub max_temperature: Option<TemperatureForecast>,
    pub min_temperature: Option<TemperatureForecast>,
    pub remarks: Option<String>,
    pub unparsed: Vec<String>,
    pub raw_text: String,
}

/// Groups shared by observations and forecast periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    pub wind: Option<Wind>,
    pub visibility: Option<Visibility>,
    pub present_weather: Vec<PresentWeather>,
    pub sky_conditions: Vec<SkyCondition>,
}

impl WeatherConditions {
    pub fn is_empty(&self) -> bool {
        self.wind.is_none()
            && self.visibility.is_none()
            && self.present_weather.is_empty()
            && self.sky_conditions.is_empty()
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(wind) = &self.wind {
            parts.push(wind.to_string());
        }
        if let Some(vis) = &self.visibility {
            parts.push(vis.to_string());
        }
        parts.extend(self.present_weather.iter().map(|w| w.description.clone()));
        parts.extend(self.sky_conditions.iter().map(ToString::to_string));
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    /// `None` when the direction is variable (VRB) or missing.
    pub direction_degrees: Option<u16>,
    pub variable: bool,
    pub speed: Option<u16>,
    pub gust: Option<u16>,
    /// KT, MPS or KMH.
    pub unit: String,
    pub variable_from: Option<u16>,
    pub variable_to: Option<u16>,
}

impl Wind {
    pub fn is_calm(&self) -> bool {
        self.direction_degrees == Some(0) && self.speed == Some(0)
    }
}

impl std::fmt::Display for Wind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_calm() {
            return f.write_str("wind calm");
        }
        let unit = self.unit.to_lowercase();
        match (self.direction_degrees, self.variable) {
            (_, true) => f.write_str("wind variable")?,
            (Some(dir), false) => write!(f, "wind {dir:03}°")?,
            (None, false) => f.write_str("wind")?,
        }
        if let Some(speed) = self.speed {
            write!(f, " at {speed} {unit}")?;
        }
        if let Some(gust) = self.gust {
            write!(f, " gusting {gust} {unit}")?;
        }
        if let (Some(from), Some(to)) = (self.variable_from, self.variable_to) {
            write!(f, " (varying {from:03}°-{to:03}°)")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visibility {
    pub distance: Option<f64>,
    /// M, SM or KM. `None` for CAVOK.
    pub unit: Option<String>,
    pub less_than: bool,
    pub greater_than: bool,
    pub cavok: bool,
}

impl Visibility {
    pub fn cavok() -> Self {
        Self {
            distance: None,
            unit: None,
            less_than: false,
            greater_than: false,
            cavok: true,
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cavok {
            return f.write_str("ceiling and visibility OK");
        }
        f.write_str("visibility ")?;
        if self.less_than {
            f.write_str("less than ")?;
        } else if self.greater_than {
            f.write_str("more than ")?;
        }
        match (self.distance, &self.unit) {
            (Some(d), Some(u)) => write!(f, "{d} {u}"),
            (Some(d), None) => write!(f, "{d}"),
            _ => f.write_str("unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayVisualRange {
    pub runway: String,
    /// Single reported value; `None` when variable or cleared.
    pub visual_range: Option<u32>,
    pub variable_low: Option<u32>,
    pub variable_high: Option<u32>,
    /// `M` (below) or `P` (above) on the reported value.
    pub prefix: Option<String>,
    /// U (up), D (down) or N (no change).
    pub trend: Option<String>,
    pub cleared: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentWeather {
    /// The group as it appeared in the report.
    pub code: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkyCoverage {
    SkyClear,
    Clear,
    NoSignificantClouds,
    NoCloudsDetected,
    Few,
    Scattered,
    Broken,
    Overcast,
    VerticalVisibility,
}

impl SkyCoverage {
    pub fn code(&self) -> &'static str {
        match self {
            SkyCoverage::SkyClear => "SKC",
            SkyCoverage::Clear => "CLR",
            SkyCoverage::NoSignificantClouds => "NSC",
            SkyCoverage::NoCloudsDetected => "NCD",
            SkyCoverage::Few => "FEW",
            SkyCoverage::Scattered => "SCT",
            SkyCoverage::Broken => "BKN",
            SkyCoverage::Overcast => "OVC",
            SkyCoverage::VerticalVisibility => "VV",
        }
    }

    /// Accepts the common OCR slips `0VC` and `SCK`.
    pub fn from_code(code: &str) -> Option<Self> {
        let coverage = match code {
            "SKC" | "SCK" => SkyCoverage::SkyClear,
            "CLR" => SkyCoverage::Clear,
            "NSC" => SkyCoverage::NoSignificantClouds,
            "NCD" => SkyCoverage::NoCloudsDetected,
            "FEW" => SkyCoverage::Few,
            "SCT" => SkyCoverage::Scattered,
            "BKN" => SkyCoverage::Broken,
            "OVC" | "0VC" => SkyCoverage::Overcast,
            "VV" => SkyCoverage::VerticalVisibility,
            _ => return None,
        };
        Some(coverage)
    }

    pub fn is_clear(&self) -> bool {
        matches!(
            self,
            SkyCoverage::SkyClear
                | SkyCoverage::Clear
                | SkyCoverage::NoSignificantClouds
                | SkyCoverage::NoCloudsDetected
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkyCondition {
    pub coverage: SkyCoverage,
    pub height_feet: Option<u32>,
    pub cloud_type: Option<String>,
}

impl std::fmt::Display for SkyCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&decode_sky_coverage(self.coverage.code()))?;
        if let Some(height) = self.height_feet {
            write!(f, " at {height} ft")?;
        }
        if let Some(cloud) = &self.cloud_type {
            write!(f, " ({})", decode_cloud_type(cloud))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub celsius: f64,
    pub dewpoint_celsius: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureUnit {
    InchesHg,
    Hectopascals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pressure {
    pub value: f64,
    pub unit: PressureUnit,
}

impl std::fmt::Display for Pressure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.unit {
            PressureUnit::InchesHg => write!(f, "{:.2} inHg", self.value),
            PressureUnit::Hectopascals => write!(f, "{} hPa", self.value),
        }
    }
}

/// Decoded METAR remarks. Groups not listed here stay only in `raw`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Remarks {
    pub raw: String,
    /// AO1 or AO2.
    pub automated_station: Option<String>,
    pub sea_level_pressure_hpa: Option<f64>,
    pub peak_wind: Option<PeakWind>,
    pub wind_shift: Option<WindShift>,
    pub rapid_pressure_change: Option<RapidPressureChange>,
    /// `T` group: temperature and dewpoint to a tenth of a degree.
    pub hourly_temperature: Option<Temperature>,
    /// Inches over the past hour.
    pub hourly_precipitation_in: Option<f64>,
    /// Inches over the past 3 or 6 hours (`6RRRR`).
    pub six_hour_precipitation_in: Option<f64>,
    /// Inches over the past 24 hours (`7RRRR`).
    pub daily_precipitation_in: Option<f64>,
    pub six_hour_max_celsius: Option<f64>,
    pub six_hour_min_celsius: Option<f64>,
    pub daily_max_celsius: Option<f64>,
    pub daily_min_celsius: Option<f64>,
    pub pressure_tendency: Option<PressureTendency>,
    /// Sensor status groups such as PWINO or TSNO.
    pub sensor_outages: Vec<String>,
    /// `$`: the station needs maintenance.
    pub maintenance_needed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakWind {
    pub direction_degrees: u16,
    pub speed: u16,
    /// Absent when the peak fell in the observation's own hour.
    pub hour: Option<u32>,
    pub minute: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindShift {
    pub hour: Option<u32>,
    pub minute: u32,
    pub frontal_passage: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RapidPressureChange {
    Rising,
    Falling,
}

/// `5appp`: WMO tendency characteristic and 3-hour change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureTendency {
    pub characteristic: u8,
    pub change_hpa: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeIndicator {
    Base,
    From,
    Becoming,
    Tempo,
    Probability,
}

impl ChangeIndicator {
    pub fn code(&self) -> &'static str {
        match self {
            ChangeIndicator::Base => "BASE",
            ChangeIndicator::From => "FM",
            ChangeIndicator::Becoming => "BECMG",
            ChangeIndicator::Tempo => "TEMPO",
            ChangeIndicator::Probability => "PROB",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub change: ChangeIndicator,
    /// Percentage for PROB groups.
    pub probability: Option<u8>,
    /// Set for PROB30 TEMPO style groups.
    pub tempo: bool,
    /// Start time of an FM group.
    pub from: Option<DateTime<Utc>>,
    /// `DDHH/DDHH` window of BECMG, TEMPO and PROB groups.
    pub window: Option<ValidityPeriod>,
    pub conditions: WeatherConditions,
}

impl ForecastPeriod {
    pub fn base() -> Self {
        Self {
            change: ChangeIndicator::Base,
            probability: None,
            tempo: false,
            from: None,
            window: None,
            conditions: WeatherConditions::default(),
        }
    }

    pub fn label(&self) -> String {
        let mut label = match (self.change, self.probability) {
            (ChangeIndicator::Probability, Some(p)) => format!("PROB{p:02}"),
            (change, _) => change.code().to_string(),
        };
        if self.tempo && self.change == ChangeIndicator::Probability {
            label.push_str(" TEMPO");
        }
        if let Some(from) = self.from {
            let _ = write!(label, " {}", from.format("%d %H:%MZ"));
        }
        if let Some(window) = self.window {
            let _ = write!(
                label,
                " {}-{}",
                window.start.format("%d %H:%MZ"),
                window.end.format("%d %H:%MZ")
            );
        }
        label
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureForecast {
    pub celsius: f64,
    pub time: DateTime<Utc>,
}
