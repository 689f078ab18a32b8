//! ICAO Annex 3 / WMO code tables used across METAR, TAF and SPECI products.
//!
//! Each table is a static slice of `(code, description)` pairs. Lookups go
//! through hash maps built once on first use; nothing here is ever mutated.

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const IN_THE_VICINITY: &str = "In the Vicinity";

pub const SKY_COVERAGE: &[(&str, &str)] = &[
    ("SKC", "Sky Clear"),
    ("CLR", "Clear"),
    ("NSC", "No Significant Clouds"),
    ("NCD", "No Clouds Detected"),
    ("FEW", "Few"),
    ("SCT", "Scattered"),
    ("BKN", "Broken"),
    ("OVC", "Overcast"),
    ("VV", "Vertical Visibility"),
    ("///", "Sky Obscured"),
];

pub const WEATHER_PHENOMENA: &[(&str, &str)] = &[
    // precipitation
    ("DZ", "Drizzle"),
    ("RA", "Rain"),
    ("SN", "Snow"),
    ("SG", "Snow Grains"),
    ("IC", "Ice Crystals"),
    ("PL", "Ice Pellets"),
    ("GR", "Hail"),
    ("GS", "Small Hail"),
    ("UP", "Unknown Precipitation"),
    // obscuration
    ("BR", "Mist"),
    ("FG", "Fog"),
    ("FU", "Smoke"),
    ("VA", "Volcanic Ash"),
    ("DU", "Widespread Dust"),
    ("SA", "Sand"),
    ("HZ", "Haze"),
    ("PY", "Spray"),
    // other
    ("PO", "Dust/Sand Whirls"),
    ("SQ", "Squalls"),
    ("FC", "Funnel Cloud"),
    ("SS", "Sandstorm"),
    ("DS", "Duststorm"),
];

pub const INTENSITY: &[(&str, &str)] = &[
    ("-", "Light"),
    ("+", "Heavy"),
    ("VC", IN_THE_VICINITY),
];

pub const DESCRIPTORS: &[(&str, &str)] = &[
    ("MI", "Shallow"),
    ("PR", "Partial"),
    ("BC", "Patches"),
    ("DR", "Low Drifting"),
    ("BL", "Blowing"),
    ("SH", "Shower(s)"),
    ("TS", "Thunderstorm"),
    ("FZ", "Freezing"),
];

pub const CLOUD_TYPES: &[(&str, &str)] = &[
    ("CB", "Cumulonimbus"),
    ("TCU", "Towering Cumulus"),
    ("CU", "Cumulus"),
    ("SC", "Stratocumulus"),
    ("ST", "Stratus"),
    ("NS", "Nimbostratus"),
    ("AS", "Altostratus"),
    ("AC", "Altocumulus"),
    ("CI", "Cirrus"),
    ("CC", "Cirrocumulus"),
    ("CS", "Cirrostratus"),
];

/// The five code categories, each backed by one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeCategory {
    SkyCoverage,
    WeatherPhenomenon,
    Intensity,
    Descriptor,
    CloudType,
}

impl CodeCategory {
    pub const fn all() -> &'static [CodeCategory] {
        &[
            CodeCategory::SkyCoverage,
            CodeCategory::WeatherPhenomenon,
            CodeCategory::Intensity,
            CodeCategory::Descriptor,
            CodeCategory::CloudType,
        ]
    }

    pub fn entries(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            CodeCategory::SkyCoverage => SKY_COVERAGE,
            CodeCategory::WeatherPhenomenon => WEATHER_PHENOMENA,
            CodeCategory::Intensity => INTENSITY,
            CodeCategory::Descriptor => DESCRIPTORS,
            CodeCategory::CloudType => CLOUD_TYPES,
        }
    }

    /// Exact lookup; no normalization happens here.
    pub fn lookup(&self, code: &str) -> Option<&'static str> {
        let index = match self {
            CodeCategory::SkyCoverage => &*SKY_COVERAGE_INDEX,
            CodeCategory::WeatherPhenomenon => &*WEATHER_PHENOMENA_INDEX,
            CodeCategory::Intensity => &*INTENSITY_INDEX,
            CodeCategory::Descriptor => &*DESCRIPTORS_INDEX,
            CodeCategory::CloudType => &*CLOUD_TYPES_INDEX,
        };
        index.get(code).copied()
    }
}

type CodeIndex = HashMap<&'static str, &'static str>;

fn index(entries: &'static [(&'static str, &'static str)]) -> CodeIndex {
    entries.iter().copied().collect()
}

static SKY_COVERAGE_INDEX: Lazy<CodeIndex> = Lazy::new(|| index(SKY_COVERAGE));
static WEATHER_PHENOMENA_INDEX: Lazy<CodeIndex> = Lazy::new(|| index(WEATHER_PHENOMENA));
static INTENSITY_INDEX: Lazy<CodeIndex> = Lazy::new(|| index(INTENSITY));
static DESCRIPTORS_INDEX: Lazy<CodeIndex> = Lazy::new(|| index(DESCRIPTORS));
static CLOUD_TYPES_INDEX: Lazy<CodeIndex> = Lazy::new(|| index(CLOUD_TYPES));
