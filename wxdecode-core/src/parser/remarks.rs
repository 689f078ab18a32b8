//! METAR remarks (everything after `RMK`).
//!
//! Remarks are free-form; only the coded groups NOAA stations send routinely
//! are decoded. Anything else survives in [`Remarks::raw`].

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::groups::re;
use crate::model::{
    PeakWind, PressureTendency, RapidPressureChange, Remarks, Temperature, WindShift,
};

static SEA_LEVEL_PRESSURE: Lazy<Regex> = Lazy::new(|| re(r"^SLP(?P<value>\d{3})$"));
static PEAK_WIND: Lazy<Regex> = Lazy::new(|| {
    re(r"^(?P<dir>\d{3})(?P<speed>\d{2,3})/(?P<hour>\d{2})?(?P<min>\d{2})$")
});
static SHIFT_TIME: Lazy<Regex> = Lazy::new(|| re(r"^(?P<hour>\d{2})?(?P<min>\d{2})$"));
static HOURLY_TEMPERATURE: Lazy<Regex> = Lazy::new(|| {
    re(r"^T(?P<tsign>[01])(?P<temp>\d{3})(?:(?P<dsign>[01])(?P<dew>\d{3}))?$")
});
static HOURLY_PRECIPITATION: Lazy<Regex> = Lazy::new(|| re(r"^P(?P<amount>\d{4})$"));
static PERIOD_PRECIPITATION: Lazy<Regex> =
    Lazy::new(|| re(r"^(?P<kind>[67])(?P<amount>\d{4}|/{4})$"));
static SIX_HOUR_EXTREME: Lazy<Regex> =
    Lazy::new(|| re(r"^(?P<kind>[12])(?P<sign>[01])(?P<temp>\d{3})$"));
static DAILY_EXTREMES: Lazy<Regex> = Lazy::new(|| {
    re(r"^4(?P<maxsign>[01])(?P<max>\d{3})(?P<minsign>[01])(?P<min>\d{3})$")
});
static PRESSURE_TENDENCY: Lazy<Regex> =
    Lazy::new(|| re(r"^5(?P<tendency>[0-8])(?P<change>\d{3})$"));

pub(crate) fn parse_remarks(tokens: &[&str]) -> Remarks {
    let mut remarks = Remarks {
        raw: tokens.join(" "),
        ..Remarks::default()
    };

    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        match token {
            "AO1" | "AO2" => remarks.automated_station = Some(token.to_string()),
            "PRESRR" => remarks.rapid_pressure_change = Some(RapidPressureChange::Rising),
            "PRESFR" => remarks.rapid_pressure_change = Some(RapidPressureChange::Falling),
            "$" => remarks.maintenance_needed = true,
            "RVRNO" | "PWINO" | "PNO" | "FZRANO" | "TSNO" | "VISNO" | "CHINO" => {
                remarks.sensor_outages.push(token.to_string());
            }
            "PK" if tokens.get(i + 1) == Some(&"WND") => {
                if let Some(peak) = tokens.get(i + 2).and_then(|t| peak_wind(t)) {
                    remarks.peak_wind = Some(peak);
                    i += 2;
                }
            }
            "WSHFT" => {
                if let Some(caps) = tokens.get(i + 1).and_then(|t| SHIFT_TIME.captures(t)) {
                    let frontal_passage = tokens.get(i + 2) == Some(&"FROPA");
                    remarks.wind_shift = Some(WindShift {
                        hour: caps.name("hour").and_then(|h| h.as_str().parse().ok()),
                        minute: caps["min"].parse().unwrap_or_default(),
                        frontal_passage,
                    });
                    i += if frontal_passage { 2 } else { 1 };
                }
            }
            _ => decode_numeric_group(token, &mut remarks),
        }
        i += 1;
    }
    remarks
}

fn decode_numeric_group(token: &str, remarks: &mut Remarks) {
    if let Some(caps) = SEA_LEVEL_PRESSURE.captures(token) {
        // Tenths of hPa without the leading 9 or 10.
        let tenths: u32 = caps["value"].parse().unwrap_or_default();
        let base = if tenths < 500 { 10_000 } else { 9_000 };
        remarks.sea_level_pressure_hpa = Some(f64::from(base + tenths) / 10.0);
    } else if let Some(caps) = HOURLY_TEMPERATURE.captures(token) {
        let dewpoint = caps
            .name("dsign")
            .zip(caps.name("dew"))
            .and_then(|(s, d)| signed_tenths(s.as_str(), d.as_str()));
        remarks.hourly_temperature =
            signed_tenths(&caps["tsign"], &caps["temp"]).map(|celsius| Temperature {
                celsius,
                dewpoint_celsius: dewpoint,
            });
    } else if let Some(caps) = HOURLY_PRECIPITATION.captures(token) {
        remarks.hourly_precipitation_in = hundredths(&caps["amount"]);
    } else if let Some(caps) = PERIOD_PRECIPITATION.captures(token) {
        let amount = hundredths(&caps["amount"]);
        match &caps["kind"] {
            "6" => remarks.six_hour_precipitation_in = amount,
            _ => remarks.daily_precipitation_in = amount,
        }
    } else if let Some(caps) = SIX_HOUR_EXTREME.captures(token) {
        let value = signed_tenths(&caps["sign"], &caps["temp"]);
        match &caps["kind"] {
            "1" => remarks.six_hour_max_celsius = value,
            _ => remarks.six_hour_min_celsius = value,
        }
    } else if let Some(caps) = DAILY_EXTREMES.captures(token) {
        remarks.daily_max_celsius = signed_tenths(&caps["maxsign"], &caps["max"]);
        remarks.daily_min_celsius = signed_tenths(&caps["minsign"], &caps["min"]);
    } else if let Some(caps) = PRESSURE_TENDENCY.captures(token) {
        remarks.pressure_tendency = Some(PressureTendency {
            characteristic: caps["tendency"].parse().unwrap_or_default(),
            change_hpa: f64::from(caps["change"].parse::<u16>().unwrap_or_default()) / 10.0,
        });
    } else {
        debug!(group = token, "Remark kept as text");
    }
}

fn peak_wind(token: &str) -> Option<PeakWind> {
    let caps = PEAK_WIND.captures(token)?;
    Some(PeakWind {
        direction_degrees: caps["dir"].parse().ok()?,
        speed: caps["speed"].parse().ok()?,
        hour: caps.name("hour").and_then(|h| h.as_str().parse().ok()),
        minute: caps["min"].parse().ok()?,
    })
}

/// Sign digit `1` means below zero.
fn signed_tenths(sign: &str, digits: &str) -> Option<f64> {
    let value = f64::from(digits.parse::<u16>().ok()?) / 10.0;
    Some(if sign == "1" { -value } else { value })
}

/// `////` marks an indeterminate amount.
fn hundredths(digits: &str) -> Option<f64> {
    Some(f64::from(digits.parse::<u16>().ok()?) / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn remarks(text: &str) -> Remarks {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        parse_remarks(&tokens)
    }

    #[test]
    fn decodes_routine_hourly_groups() {
        let r =
            remarks("AO2 PK WND 28045/1830 WSHFT 1830 SLP132 P0015 T02220122 10250 20200 56012");

        assert_eq!(r.automated_station.as_deref(), Some("AO2"));
        assert_eq!(
            r.peak_wind,
            Some(PeakWind {
                direction_degrees: 280,
                speed: 45,
                hour: Some(18),
                minute: 30,
            })
        );
        assert_eq!(
            r.wind_shift,
            Some(WindShift {
                hour: Some(18),
                minute: 30,
                frontal_passage: false,
            })
        );
        assert_eq!(r.sea_level_pressure_hpa, Some(1013.2));
        assert_eq!(r.hourly_precipitation_in, Some(0.15));
        assert_eq!(
            r.hourly_temperature,
            Some(Temperature {
                celsius: 22.2,
                dewpoint_celsius: Some(12.2),
            })
        );
        assert_eq!(r.six_hour_max_celsius, Some(25.0));
        assert_eq!(r.six_hour_min_celsius, Some(20.0));
        assert_eq!(
            r.pressure_tendency,
            Some(PressureTendency {
                characteristic: 6,
                change_hpa: 1.2,
            })
        );
    }

    #[test]
    fn negative_temperatures_use_sign_digit() {
        let r = remarks("T10061017 11012 21034 401001015");
        let t = r.hourly_temperature.unwrap();
        assert_eq!((t.celsius, t.dewpoint_celsius), (-0.6, Some(-1.7)));
        assert_eq!(r.six_hour_max_celsius, Some(-1.2));
        assert_eq!(r.six_hour_min_celsius, Some(-3.4));
        assert_eq!(r.daily_max_celsius, Some(10.0));
        assert_eq!(r.daily_min_celsius, Some(-1.5));
    }

    #[test]
    fn period_precipitation_and_indeterminate_amounts() {
        let r = remarks("60009 70125");
        assert_eq!(r.six_hour_precipitation_in, Some(0.09));
        assert_eq!(r.daily_precipitation_in, Some(1.25));

        let r = remarks("6////");
        assert_eq!(r.six_hour_precipitation_in, None);
    }

    #[test]
    fn low_sea_level_pressure_uses_900_base() {
        assert_eq!(remarks("SLP982").sea_level_pressure_hpa, Some(998.2));
    }

    #[test]
    fn peak_wind_within_the_hour_and_frontal_wind_shift() {
        let r = remarks("PK WND 09102/05 WSHFT 30 FROPA PRESFR");
        assert_eq!(
            r.peak_wind,
            Some(PeakWind {
                direction_degrees: 91,
                speed: 2,
                hour: None,
                minute: 5,
            })
        );
        assert_eq!(
            r.wind_shift,
            Some(WindShift {
                hour: None,
                minute: 30,
                frontal_passage: true,
            })
        );
        assert_eq!(r.rapid_pressure_change, Some(RapidPressureChange::Falling));
    }

    #[test]
    fn maintenance_and_sensor_status() {
        let r = remarks("AO2 PWINO TSNO $");
        assert!(r.maintenance_needed);
        assert_eq!(r.sensor_outages, vec!["PWINO", "TSNO"]);
    }

    #[test]
    fn free_text_stays_in_raw_only() {
        let r = remarks("FRQ LTGIC DSNT NE");
        assert_eq!(r.raw, "FRQ LTGIC DSNT NE");
        assert_eq!(
            r,
            Remarks {
                raw: r.raw.clone(),
                ..Remarks::default()
            }
        );
    }
}
