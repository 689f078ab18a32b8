use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{ReportParser, groups};
use crate::{
    ParseOutcome, WeatherReport,
    model::{ChangeIndicator, ForecastPeriod, TafReport, TemperatureForecast, ValidityPeriod},
};

pub const SOURCE_TYPE: &str = "NOAA_TAF";

static FROM_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^FM(?P<day>\d{2})(?P<hour>\d{2})(?P<min>\d{2})$").expect("valid FM pattern")
});
static PROB_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PROB(?P<pct>\d{2})$").expect("valid PROB pattern"));
static TEMP_FORECAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<kind>TX|TN)(?P<sign>M)?(?P<temp>\d{2})/(?P<day>\d{2})(?P<hour>\d{2})Z$")
        .expect("valid TX/TN pattern")
});

/// Parser for terminal aerodrome forecasts in NOAA text format.
#[derive(Debug, Clone, Default)]
pub struct TafParser {
    strict: bool,
    reference_time: Option<DateTime<Utc>>,
}

impl TafParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject forecasts containing groups that match no known pattern.
    pub fn with_strict_mode(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Clock used to place the issue time when the forecast carries no
    /// issue date line. Defaults to the current time.
    pub fn with_reference_time(mut self, reference: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference);
        self
    }

    fn decode(&self, text: &str) -> Result<TafReport> {
        let (issue_line, body) = groups::strip_issue_prefix(text);
        let tokens: Vec<&str> = body.split_whitespace().collect();

        let mut i = 1; // past "TAF"
        let modifier = match tokens.get(i) {
            Some(&m @ ("AMD" | "COR")) => {
                i += 1;
                Some(m.to_string())
            }
            _ => None,
        };

        let station_id = tokens
            .get(i)
            .filter(|t| groups::is_station(t))
            .ok_or_else(|| anyhow!("Could not extract station ID from TAF"))?
            .to_string();
        i += 1;

        let (day, hour, minute) = tokens
            .get(i)
            .and_then(|t| groups::day_time(t))
            .ok_or_else(|| anyhow!("Could not extract issue time from TAF"))?;
        i += 1;
        let reference = issue_line.or(self.reference_time).unwrap_or_else(Utc::now);
        let issue_time = groups::instant_before(reference, day, hour, minute)
            .ok_or_else(|| anyhow!("Invalid issue time in TAF"))?;

        let validity = tokens
            .get(i)
            .and_then(|t| window(issue_time, t))
            .ok_or_else(|| anyhow!("Could not extract validity period from TAF"))?;
        i += 1;
        debug!(station = %station_id, %issue_time, ?validity, "TAF header");

        let mut report = TafReport {
            station_id,
            modifier,
            issue_time,
            validity,
            periods: Vec::new(),
            max_temperature: None,
            min_temperature: None,
            remarks: None,
            unparsed: Vec::new(),
            raw_text: text.to_string(),
        };

        let mut current = ForecastPeriod::base();
        while i < tokens.len() {
            let token = tokens[i];

            if token == "RMK" {
                report.remarks = Some(tokens[i + 1..].join(" "));
                break;
            }

            if let Some(caps) = FROM_GROUP.captures(token) {
                let (day, hour, minute): (u32, u32, u32) =
                    (caps["day"].parse()?, caps["hour"].parse()?, caps["min"].parse()?);
                let from = groups::instant_after(validity.start, day, hour, minute)
                    .ok_or_else(|| {
                        anyhow!(
                            "no time {day:02} {hour:02}:{minute:02} follows {}",
                            validity.start.format("%Y-%m-%d %H:%MZ")
                        )
                    })
                    .with_context(|| format!("Invalid change time '{token}' in TAF"))?;
                report.periods.push(current);
                current = change_period(ChangeIndicator::From);
                current.from = Some(from);
                i += 1;
                continue;
            }

            let change = match token {
                "BECMG" => Some(change_period(ChangeIndicator::Becoming)),
                "TEMPO" if is_bare_probability(&current) => {
                    current.tempo = true;
                    i += 1;
                    continue;
                }
                "TEMPO" => Some(change_period(ChangeIndicator::Tempo)),
                _ => PROB_GROUP.captures(token).map(|caps| {
                    let mut period = change_period(ChangeIndicator::Probability);
                    period.probability = caps["pct"].parse().ok();
                    period
                }),
            };
            if let Some(next) = change {
                debug!(group = token, "TAF change group");
                report.periods.push(current);
                current = next;
                i += 1;
                continue;
            }

            if current.window.is_none() && current.change != ChangeIndicator::Base {
                if let Some(w) = window(validity.start, token) {
                    current.window = Some(w);
                    i += 1;
                    continue;
                }
            }

            let used = groups::take_condition(&tokens[i..], &mut current.conditions);
            if used > 0 {
                i += used;
                continue;
            }

            if let Some(forecast) = temperature_forecast(validity.start, token) {
                match &token[..2] {
                    "TX" => report.max_temperature = Some(forecast),
                    _ => report.min_temperature = Some(forecast),
                }
            } else if !groups::is_missing(token) && token != "NIL" {
                report.unparsed.push(token.to_string());
            }
            i += 1;
        }
        report.periods.push(current);

        if !report.unparsed.is_empty() {
            debug!(
                station = %report.station_id,
                unparsed = ?report.unparsed,
                "Unparsed TAF groups"
            );
            if self.strict {
                bail!("Unrecognized TAF group(s): {}", report.unparsed.join(" "));
            }
        }

        Ok(report)
    }
}

fn change_period(change: ChangeIndicator) -> ForecastPeriod {
    ForecastPeriod { change, ..ForecastPeriod::base() }
}

/// A `PROBnn` group still waiting for its optional `TEMPO` qualifier.
fn is_bare_probability(period: &ForecastPeriod) -> bool {
    period.change == ChangeIndicator::Probability
        && !period.tempo
        && period.window.is_none()
        && period.conditions.is_empty()
}

fn window(anchor: DateTime<Utc>, token: &str) -> Option<ValidityPeriod> {
    let ((bday, bhour), (eday, ehour)) = groups::period(token)?;
    let start = groups::instant_after(anchor, bday, bhour, 0)?;
    let end = groups::instant_after(start, eday, ehour, 0)?;
    Some(ValidityPeriod { start, end })
}

fn temperature_forecast(anchor: DateTime<Utc>, token: &str) -> Option<TemperatureForecast> {
    let caps = TEMP_FORECAST.captures(token)?;
    let value: f64 = caps["temp"].parse().ok()?;
    let time = groups::instant_after(
        anchor,
        caps["day"].parse().ok()?,
        caps["hour"].parse().ok()?,
        0,
    )?;

    Some(TemperatureForecast {
        celsius: if caps.name("sign").is_some() { -value } else { value },
        time,
    })
}

impl ReportParser for TafParser {
    /// Accepts text that starts with `TAF`, optionally after a NOAA issue
    /// date line.
    fn can_parse(&self, raw: &str) -> bool {
        let (_, body) = groups::strip_issue_prefix(raw.trim());
        let mut tokens = body.split_whitespace();
        tokens.next() == Some("TAF") && tokens.next().is_some()
    }

    fn parse(&self, raw: &str) -> ParseOutcome<WeatherReport> {
        if raw.trim().is_empty() {
            return ParseOutcome::failure("Raw data cannot be null or empty");
        }
        if !self.can_parse(raw) {
            return ParseOutcome::failure("Data is not a valid TAF report");
        }

        match self.decode(raw.trim()) {
            Ok(report) => ParseOutcome::success(WeatherReport::Taf(report)),
            Err(err) => ParseOutcome::failure(format!("{err:#}")),
        }
    }

    fn source_type(&self) -> &str {
        SOURCE_TYPE
    }
}
