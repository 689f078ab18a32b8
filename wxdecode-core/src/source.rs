use std::{fmt, str::FromStr};

/// Provider or format a raw report came from.
///
/// Used as a routing hint by [`crate::ParserRegistry::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    Noaa,
    OpenWeatherMap,
    WeatherApi,
    VisualCrossing,
    Internal,
    Unknown,
}

impl DataSource {
    /// Upper-snake name, also used as the registry key for sources without
    /// a dedicated mapping.
    pub fn name(&self) -> &'static str {
        match self {
            DataSource::Noaa => "NOAA",
            DataSource::OpenWeatherMap => "OPENWEATHERMAP",
            DataSource::WeatherApi => "WEATHERAPI",
            DataSource::VisualCrossing => "VISUAL_CROSSING",
            DataSource::Internal => "INTERNAL",
            DataSource::Unknown => "UNKNOWN",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DataSource::Noaa => "NOAA Aviation Weather Center",
            DataSource::OpenWeatherMap => "OpenWeatherMap",
            DataSource::WeatherApi => "WeatherAPI",
            DataSource::VisualCrossing => "Visual Crossing",
            DataSource::Internal => "Internal System",
            DataSource::Unknown => "Unknown Source",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            DataSource::Noaa => "https://aviationweather.gov",
            DataSource::OpenWeatherMap => "https://openweathermap.org",
            DataSource::WeatherApi => "https://weatherapi.com",
            DataSource::VisualCrossing => "https://visualcrossing.com",
            DataSource::Internal => "internal",
            DataSource::Unknown => "unknown",
        }
    }

    pub fn is_government_source(&self) -> bool {
        matches!(self, DataSource::Noaa | DataSource::Internal)
    }

    pub const fn all() -> &'static [DataSource] {
        &[
            DataSource::Noaa,
            DataSource::OpenWeatherMap,
            DataSource::WeatherApi,
            DataSource::VisualCrossing,
            DataSource::Internal,
            DataSource::Unknown,
        ]
    }

    /// Like [`FromStr`], but anything unrecognized becomes [`DataSource::Unknown`].
    pub fn from_str_lossy(value: &str) -> Self {
        value.parse().unwrap_or(DataSource::Unknown)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataSource {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase().replace(' ', "_");

        DataSource::all()
            .iter()
            .copied()
            .find(|source| source.name() == normalized)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown data source '{value}'. Supported sources: noaa, openweathermap, \
                     weatherapi, visual_crossing, internal, unknown."
                )
            })
    }
}
