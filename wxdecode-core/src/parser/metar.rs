use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{ReportParser, groups, remarks::parse_remarks};
use crate::{
    ParseOutcome, WeatherReport,
    model::{MetarReport, WeatherConditions},
};

pub const SOURCE_TYPE: &str = "NOAA_METAR";

static MODIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:AUTO|COR|CORR|AMD|NIL|TEST|FINO|RTD|CC[A-G])$")
        .expect("valid modifier pattern")
});

/// Parser for METAR and SPECI observations in NOAA text format.
#[derive(Debug, Clone, Default)]
pub struct MetarParser {
    strict: bool,
    reference_time: Option<DateTime<Utc>>,
}

impl MetarParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject reports containing body groups that match no known pattern.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Clock used to place `DDHHMMZ` times when the report carries no issue
    /// date line. Defaults to the current time.
    pub fn with_reference_time(mut self, reference: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference);
        self
    }

    fn decode(&self, text: &str) -> Result<MetarReport> {
        let (issue_time, body) = groups::strip_issue_prefix(text);
        let all: Vec<&str> = body.split_whitespace().collect();
        let (tokens, remark_tokens) = match all.iter().position(|t| *t == "RMK") {
            Some(pos) => (&all[..pos], Some(&all[pos + 1..])),
            None => (&all[..], None),
        };

        let mut i = 0;
        let report_type = match tokens.first() {
            Some(&kind @ ("METAR" | "SPECI")) => {
                i += 1;
                kind.to_string()
            }
            _ => "METAR".to_string(),
        };

        let station_id = tokens
            .get(i)
            .filter(|t| groups::is_station(t))
            .ok_or_else(|| anyhow!("Could not extract station ID from METAR"))?
            .to_string();
        i += 1;

        let time_group = tokens.get(i).copied().unwrap_or_default();
        let (day, hour, minute) = groups::day_time(time_group)
            .ok_or_else(|| anyhow!("Could not extract observation time from METAR"))?;
        i += 1;

        let reference = issue_time.or(self.reference_time).unwrap_or_else(Utc::now);
        let observation_time = groups::instant_before(reference, day, hour, minute)
            .ok_or_else(|| anyhow!("Invalid observation time '{time_group}' in METAR"))?;
        debug!(station = %station_id, %observation_time, %report_type, "METAR header");

        let mut modifiers = Vec::new();
        while let Some(&token) = tokens.get(i).filter(|t| MODIFIER.is_match(t)) {
            modifiers.push(token);
            i += 1;
        }

        let mut report = MetarReport {
            report_type,
            station_id,
            issue_time,
            observation_time,
            modifier: (!modifiers.is_empty()).then(|| modifiers.join(" ")),
            conditions: WeatherConditions::default(),
            runway_visual_ranges: Vec::new(),
            temperature: None,
            pressure: None,
            no_significant_change: false,
            remarks: remark_tokens.map(parse_remarks),
            unparsed: Vec::new(),
            raw_text: text.to_string(),
        };

        while i < tokens.len() {
            let used = groups::take_condition(&tokens[i..], &mut report.conditions);
            if used > 0 {
                i += used;
                continue;
            }

            let token = tokens[i];
            if token == "NOSIG" {
                report.no_significant_change = true;
            } else if let Some(rvr) = groups::parse_runway_visual_range(token) {
                debug!(group = token, "Runway visual range");
                report.runway_visual_ranges.push(rvr);
            } else if let Some(temperature) = groups::parse_temperature(token) {
                debug!(group = token, "Temperature/dewpoint");
                report.temperature = Some(temperature);
            } else if let Some(pressure) = groups::parse_pressure(token) {
                debug!(group = token, "Altimeter");
                report.pressure = Some(pressure);
            } else if !groups::is_missing(token) {
                report.unparsed.push(token.to_string());
            }
            i += 1;
        }

        if !report.unparsed.is_empty() {
            debug!(
                station = %report.station_id,
                unparsed = ?report.unparsed,
                "Unparsed METAR groups"
            );
            if self.strict {
                bail!("Unrecognized METAR group(s): {}", report.unparsed.join(" "));
            }
        }

        Ok(report)
    }
}

impl ReportParser for MetarParser {
    /// Accepts text that starts with `METAR`/`SPECI`, or a NOAA issue date
    /// line followed by either that keyword or a station/time header.
    fn can_parse(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return false;
        }

        let has_prefix = groups::has_issue_prefix(trimmed);
        let (_, body) = groups::strip_issue_prefix(trimmed);
        let mut tokens = body.split_whitespace();

        match tokens.next() {
            Some("METAR" | "SPECI") => tokens.next().is_some(),
            Some(station) if has_prefix => {
                groups::is_station(station) && tokens.next().and_then(groups::day_time).is_some()
            }
            _ => false,
        }
    }

    fn parse(&self, raw: &str) -> ParseOutcome<WeatherReport> {
        if raw.trim().is_empty() {
            return ParseOutcome::failure("Raw data cannot be null or empty");
        }
        if !self.can_parse(raw) {
            return ParseOutcome::failure("Data is not a valid METAR report");
        }

        match self.decode(raw.trim()) {
            Ok(report) => ParseOutcome::success(WeatherReport::Metar(report)),
            Err(err) => ParseOutcome::failure(format!("{err:#}")),
        }
    }

    fn source_type(&self) -> &str {
        SOURCE_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PressureUnit, SkyCoverage};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn parser() -> MetarParser {
        MetarParser::new().with_reference_time(Utc.with_ymd_and_hms(2024, 1, 20, 0, 0, 0).unwrap())
    }

    fn metar(raw: &str) -> MetarReport {
        match parser().parse(raw) {
            ParseOutcome::Success { data: WeatherReport::Metar(m) } => m,
            other => panic!("expected METAR, got {other:?}"),
        }
    }

    #[test]
    fn parses_a_full_observation() {
        let m = metar(
            "METAR KJFK 151851Z 28015G25KT 250V310 10SM -RA BKN025 OVC100 22/12 A2992 RMK AO2 SLP132",
        );

        assert_eq!(m.report_type, "METAR");
        assert_eq!(m.station_id, "KJFK");
        assert_eq!(m.observation_time, Utc.with_ymd_and_hms(2024, 1, 15, 18, 51, 0).unwrap());

        let wind = m.conditions.wind.as_ref().unwrap();
        assert_eq!(
            (wind.direction_degrees, wind.speed, wind.gust),
            (Some(280), Some(15), Some(25))
        );
        assert_eq!((wind.variable_from, wind.variable_to), (Some(250), Some(310)));

        assert_eq!(m.conditions.visibility.as_ref().unwrap().distance, Some(10.0));
        assert_eq!(m.conditions.present_weather[0].description, "Light Rain");
        assert_eq!(m.conditions.sky_conditions.len(), 2);
        assert_eq!(m.conditions.sky_conditions[0].coverage, SkyCoverage::Broken);
        assert_eq!(m.conditions.sky_conditions[1].height_feet, Some(10000));

        let t = m.temperature.as_ref().unwrap();
        assert_eq!((t.celsius, t.dewpoint_celsius), (22.0, Some(12.0)));
        assert_eq!(m.pressure.as_ref().unwrap().unit, PressureUnit::InchesHg);

        let remarks = m.remarks.as_ref().unwrap();
        assert_eq!(remarks.raw, "AO2 SLP132");
        assert_eq!(remarks.automated_station.as_deref(), Some("AO2"));
        assert_eq!(remarks.sea_level_pressure_hpa, Some(1013.2));
        assert!(m.unparsed.is_empty());
    }

    #[test]
    fn decodes_coded_remarks() {
        let m = metar(
            "METAR KJFK 151851Z 28015KT 10SM FEW250 22/12 A2992 \
             RMK AO2 PK WND 28045/1830 WSHFT 1830 SLP132 P0015 T02220122 10250 20200 56012 $",
        );

        let remarks = m.remarks.as_ref().unwrap();
        assert_eq!(remarks.peak_wind.as_ref().map(|p| p.speed), Some(45));
        assert_eq!(remarks.wind_shift.as_ref().map(|w| w.minute), Some(30));
        assert_eq!(remarks.hourly_precipitation_in, Some(0.15));
        assert_eq!(remarks.hourly_temperature.as_ref().map(|t| t.celsius), Some(22.2));
        assert_eq!(
            (remarks.six_hour_max_celsius, remarks.six_hour_min_celsius),
            (Some(25.0), Some(20.0))
        );
        assert_eq!(remarks.pressure_tendency.as_ref().map(|p| p.change_hpa), Some(1.2));
        assert!(remarks.maintenance_needed);
        assert!(m.unparsed.is_empty());
    }

    #[test]
    fn uses_issue_line_for_year_and_month() {
        let m =
            metar("2023/12/31 23:50\nKORD 312350Z AUTO 00000KT 1 1/2SM BR OVC004 M02/M03 A3012");
        assert_eq!(m.issue_time, Some(Utc.with_ymd_and_hms(2023, 12, 31, 23, 50, 0).unwrap()));
        assert_eq!(m.observation_time, Utc.with_ymd_and_hms(2023, 12, 31, 23, 50, 0).unwrap());
        assert_eq!(m.modifier.as_deref(), Some("AUTO"));
        assert!(m.conditions.wind.as_ref().unwrap().is_calm());
        assert_eq!(m.conditions.visibility.as_ref().unwrap().distance, Some(1.5));
        assert_eq!(m.temperature.as_ref().unwrap().celsius, -2.0);
    }

    #[test]
    fn speci_with_international_groups() {
        let m = metar("SPECI EGLL 201020Z 24008KT 9999 R27L/1200U SCT030 15/09 Q1018 NOSIG");
        assert_eq!(m.report_type, "SPECI");
        assert_eq!(m.conditions.visibility.as_ref().unwrap().unit.as_deref(), Some("M"));
        assert_eq!(m.runway_visual_ranges[0].runway, "27L");
        assert_eq!(m.pressure.as_ref().unwrap().value, 1018.0);
        assert!(m.no_significant_change);
    }

    #[test]
    fn day_after_reference_belongs_to_previous_month() {
        let m = metar("METAR KJFK 281851Z 28015KT");
        assert_eq!(m.observation_time, Utc.with_ymd_and_hms(2023, 12, 28, 18, 51, 0).unwrap());
    }

    #[test]
    fn unknown_groups_are_kept_when_lenient() {
        let m = metar("METAR KJFK 151851Z 28015KT 10SM ZZZZ FEW250");
        assert_eq!(m.unparsed, vec!["ZZZZ".to_string()]);
        assert_eq!(m.conditions.sky_conditions.len(), 1);
    }

    #[test]
    fn unknown_groups_fail_in_strict_mode() {
        let outcome = parser()
            .with_strict_mode(true)
            .parse("METAR KJFK 151851Z 28015KT 10SM ZZZZ FEW250");
        assert_eq!(outcome.error_message(), Some("Unrecognized METAR group(s): ZZZZ"));
    }

    #[test]
    fn missing_station_is_a_failure() {
        let outcome = parser().parse("METAR 151851Z 28015KT");
        assert_eq!(outcome.error_message(), Some("Could not extract station ID from METAR"));
    }

    #[test]
    fn impossible_day_is_a_failure() {
        let outcome = parser().parse("METAR KJFK 991851Z 28015KT");
        assert!(outcome.error_message().unwrap().contains("Invalid observation time"));
    }

    #[test]
    fn rejects_blank_and_foreign_text() {
        assert_eq!(parser().parse("  ").error_message(), Some("Raw data cannot be null or empty"));
        assert_eq!(
            parser().parse("TAF KJFK 151720Z 1518/1624").error_message(),
            Some("Data is not a valid METAR report")
        );
    }

    #[test]
    fn can_parse_variants() {
        let p = parser();
        assert!(p.can_parse("  METAR KJFK 151851Z"));
        assert!(p.can_parse("2024/01/15 18:51 KJFK 151851Z 28015KT"));
        assert!(!p.can_parse("2024/01/15 18:51 TAF KJFK 151720Z"));
        assert!(!p.can_parse("KJFK 151851Z 28015KT"));
        assert!(!p.can_parse("METAR"));
        assert!(!p.can_parse(""));
    }
}
