//! Group-level tokenizers shared by the METAR and TAF parsers.
//!
//! Every function here looks at whitespace-separated report groups and
//! either recognizes them or returns `None`; none of them fail loudly.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::decoder::decode_weather;
use crate::model::{
    PresentWeather, Pressure, PressureUnit, RunwayVisualRange, SkyCondition, SkyCoverage,
    Temperature, Visibility, WeatherConditions, Wind,
};

pub(crate) fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in group pattern must compile")
}

static ISSUE_PREFIX: Lazy<Regex> = Lazy::new(|| {
    re(r"^(?P<year>\d{4})/(?P<month>\d{2})/(?P<day>\d{2})(?:\s+(?P<hour>\d{2}):(?P<min>\d{2}))?\s+")
});
static ISSUE_LINE: Lazy<Regex> =
    Lazy::new(|| re(r"^\d{4}/\d{2}/\d{2}(?:\s+\d{2}:\d{2})?$"));
static STATION: Lazy<Regex> = Lazy::new(|| re(r"^[A-Z][A-Z0-9]{3}$"));
static DAY_TIME: Lazy<Regex> =
    Lazy::new(|| re(r"^(?P<day>\d{2})(?P<hour>\d{2})(?P<min>\d{2})Z$"));
static PERIOD: Lazy<Regex> = Lazy::new(|| {
    re(r"^(?P<bday>\d{2})(?P<bhour>\d{2})/(?P<eday>\d{2})(?P<ehour>\d{2})$")
});
static WIND: Lazy<Regex> = Lazy::new(|| {
    re(r"^(?P<dir>\d{3}|VRB|///)(?P<speed>\d{2,3}|//)(?:G(?P<gust>\d{2,3}))?(?P<unit>KT|MPS|KMH)$")
});
static WIND_VARIATION: Lazy<Regex> = Lazy::new(|| re(r"^(?P<from>\d{3})V(?P<to>\d{3})$"));
static VIS_METRES: Lazy<Regex> =
    Lazy::new(|| re(r"^(?P<bound>[MP])?(?P<dist>\d{4})(?:NDV|[NSEW][EW]?)?$"));
static VIS_UNITS: Lazy<Regex> = Lazy::new(|| {
    re(r"^(?P<bound>[MP])?(?P<dist>\d{1,2}/\d{1,2}|\d{1,2})(?P<unit>SM|KM)$")
});
static WHOLE_NUMBER: Lazy<Regex> = Lazy::new(|| re(r"^\d$"));
static RVR: Lazy<Regex> = Lazy::new(|| {
    re(r"^R(?P<runway>\d{2}[LRC]?)/(?P<low>[MP]?(?:\d{4}|CLRD))(?:V(?P<high>[MP]?\d{4}))?(?:FT)?/?(?P<trend>[UDN])?$")
});
static PRESENT_WEATHER: Lazy<Regex> = Lazy::new(|| {
    re(r"^(?:[-+]|VC)?(?:MI|PR|BC|DR|BL|SH|TS|FZ)*(?:DZ|RA|SN|SG|IC|PL|GR|GS|UP|BR|FG|FU|VA|DU|SA|HZ|PY|PO|SQ|FC|SS|DS)*$")
});
static SKY: Lazy<Regex> = Lazy::new(|| {
    re(r"^(?P<cover>VV|SKC|SCK|CLR|NSC|NCD|FEW|SCT|BKN|OVC|0VC)(?P<height>[\dO]{3}|///)?(?P<cloud>[A-Z]{2,3}|///)?$")
});
static TEMPERATURE: Lazy<Regex> = Lazy::new(|| {
    re(r"^(?P<tsign>M)?(?P<temp>\d{2})/(?:(?P<dsign>M)?(?P<dew>\d{2}))?$")
});
static PRESSURE: Lazy<Regex> = Lazy::new(|| re(r"^(?P<unit>A|Q)(?P<value>[\dO]{4})$"));
static MISSING: Lazy<Regex> = Lazy::new(|| re(r"^/+(?:SM|KT)?$"));

/// Split off a NOAA `YYYY/MM/DD HH:MM` issue line, returning the issue time
/// (when it is a real date) and the rest of the text.
pub(crate) fn strip_issue_prefix(text: &str) -> (Option<DateTime<Utc>>, &str) {
    let Some(caps) = ISSUE_PREFIX.captures(text) else {
        return (None, text);
    };
    let rest = &text[caps[0].len()..];

    let year: i32 = caps["year"].parse().unwrap_or_default();
    let month = number(&caps["month"]);
    let day = number(&caps["day"]);
    let hour = caps.name("hour").map_or(0, |m| number(m.as_str()));
    let minute = caps.name("min").map_or(0, |m| number(m.as_str()));

    let issue = utc_instant(year, month, day, hour, minute);
    if issue.is_none() {
        warn!(prefix = caps[0].trim(), "Ignoring invalid issue date line");
    }
    (issue, rest)
}

pub(crate) fn has_issue_prefix(text: &str) -> bool {
    ISSUE_PREFIX.is_match(text)
}

/// Whether `line` holds nothing but a NOAA issue date.
pub(crate) fn is_issue_line(line: &str) -> bool {
    ISSUE_LINE.is_match(line.trim())
}

pub(crate) fn is_station(token: &str) -> bool {
    STATION.is_match(token)
}

/// `DDHHMMZ` as `(day, hour, minute)`.
pub(crate) fn day_time(token: &str) -> Option<(u32, u32, u32)> {
    let caps = DAY_TIME.captures(token)?;
    Some((number(&caps["day"]), number(&caps["hour"]), number(&caps["min"])))
}

/// `DDHH/DDHH` as `((day, hour), (day, hour))`.
pub(crate) fn period(token: &str) -> Option<((u32, u32), (u32, u32))> {
    let caps = PERIOD.captures(token)?;
    Some((
        (number(&caps["bday"]), number(&caps["bhour"])),
        (number(&caps["eday"]), number(&caps["ehour"])),
    ))
}

/// Resolve a day-of-month time that lies at or before `reference`.
///
/// A day later than the reference day belongs to the previous month.
pub(crate) fn instant_before(
    reference: DateTime<Utc>,
    day: u32,
    hour: u32,
    minute: u32,
) -> Option<DateTime<Utc>> {
    let (mut year, mut month) = (reference.year(), reference.month());
    if day > reference.day() {
        if month == 1 {
            month = 12;
            year -= 1;
        } else {
            month -= 1;
        }
    }
    utc_instant(year, month, day, hour, minute)
}

/// Resolve a day-of-month time that lies at or after `anchor`.
///
/// A day earlier than the anchor day belongs to the next month. Hour 24 is
/// accepted as midnight of the following day.
pub(crate) fn instant_after(
    anchor: DateTime<Utc>,
    day: u32,
    hour: u32,
    minute: u32,
) -> Option<DateTime<Utc>> {
    let (mut year, mut month) = (anchor.year(), anchor.month());
    if day < anchor.day() {
        if month == 12 {
            month = 1;
            year += 1;
        } else {
            month += 1;
        }
    }
    if hour == 24 && minute == 0 {
        return utc_instant(year, month, day, 0, 0).map(|t| t + Duration::days(1));
    }
    utc_instant(year, month, day, hour, minute)
}

fn utc_instant(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Regexes only hand us ASCII digits here.
fn number(digits: &str) -> u32 {
    digits.parse().unwrap_or_default()
}

/// Consume wind, visibility, present weather and sky groups from the front
/// of `tokens` into `conditions`. Returns how many tokens were used.
pub(crate) fn take_condition(tokens: &[&str], conditions: &mut WeatherConditions) -> usize {
    let Some(&token) = tokens.first() else {
        return 0;
    };

    if let Some(wind) = parse_wind(token) {
        debug!(group = token, "Wind");
        conditions.wind = Some(wind);
        return 1;
    }
    if let Some((from, to)) = parse_wind_variation(token) {
        if let Some(wind) = conditions.wind.as_mut() {
            wind.variable_from = Some(from);
            wind.variable_to = Some(to);
            return 1;
        }
        return 0;
    }
    if let Some((visibility, used)) = parse_visibility(tokens) {
        debug!(group = token, "Visibility");
        conditions.visibility = Some(visibility);
        return used;
    }
    if let Some(sky) = parse_sky_condition(token) {
        debug!(group = token, "Sky condition");
        conditions.sky_conditions.push(sky);
        return 1;
    }
    if let Some(weather) = parse_present_weather(token) {
        debug!(group = token, decoded = %weather.description, "Present weather");
        conditions.present_weather.push(weather);
        return 1;
    }
    0
}

pub(crate) fn parse_wind(token: &str) -> Option<Wind> {
    let caps = WIND.captures(token)?;
    let dir = &caps["dir"];
    let speed = &caps["speed"];

    Some(Wind {
        direction_degrees: dir.parse().ok(),
        variable: dir == "VRB",
        speed: speed.parse().ok(),
        gust: caps.name("gust").and_then(|g| g.as_str().parse().ok()),
        unit: caps["unit"].to_string(),
        variable_from: None,
        variable_to: None,
    })
}

pub(crate) fn parse_wind_variation(token: &str) -> Option<(u16, u16)> {
    let caps = WIND_VARIATION.captures(token)?;
    Some((caps["from"].parse().ok()?, caps["to"].parse().ok()?))
}

/// Visibility may span two groups (`1 1/2SM`), so this looks at a slice.
pub(crate) fn parse_visibility(tokens: &[&str]) -> Option<(Visibility, usize)> {
    let token = *tokens.first()?;

    if token == "CAVOK" {
        return Some((Visibility::cavok(), 1));
    }
    if let Some(caps) = VIS_METRES.captures(token) {
        let bound = caps.name("bound").map(|m| m.as_str());
        return Some((
            bounded(caps["dist"].parse().ok()?, "M", bound),
            1,
        ));
    }
    if WHOLE_NUMBER.is_match(token) {
        let next = tokens.get(1)?;
        let caps = VIS_UNITS.captures(next)?;
        if caps.name("bound").is_some() || !caps["dist"].contains('/') {
            return None;
        }
        let whole: f64 = token.parse().ok()?;
        let fraction = parse_fraction(&caps["dist"])?;
        return Some((bounded(whole + fraction, &caps["unit"], None), 2));
    }
    if let Some(caps) = VIS_UNITS.captures(token) {
        let bound = caps.name("bound").map(|m| m.as_str());
        return Some((
            bounded(parse_fraction(&caps["dist"])?, &caps["unit"], bound),
            1,
        ));
    }
    None
}

fn bounded(distance: f64, unit: &str, bound: Option<&str>) -> Visibility {
    Visibility {
        distance: Some(distance),
        unit: Some(unit.to_string()),
        less_than: bound == Some("M"),
        greater_than: bound == Some("P"),
        cavok: false,
    }
}

fn parse_fraction(value: &str) -> Option<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            Some(num.parse::<f64>().ok()? / den)
        }
        None => value.parse().ok(),
    }
}

pub(crate) fn parse_runway_visual_range(token: &str) -> Option<RunwayVisualRange> {
    let caps = RVR.captures(token)?;
    let runway = caps["runway"].to_string();
    let low = &caps["low"];
    let trend = caps.name("trend").map(|t| t.as_str().to_string());

    if low.ends_with("CLRD") {
        return Some(RunwayVisualRange {
            runway,
            visual_range: None,
            variable_low: None,
            variable_high: None,
            prefix: None,
            trend,
            cleared: true,
        });
    }

    let prefix = low
        .chars()
        .next()
        .filter(|c| matches!(c, 'M' | 'P'))
        .map(String::from);
    let low_value: u32 = low.trim_start_matches(['M', 'P']).parse().ok()?;
    let high_value: Option<u32> = caps
        .name("high")
        .and_then(|h| h.as_str().trim_start_matches(['M', 'P']).parse().ok());

    let (visual_range, variable_low, variable_high) = match high_value {
        Some(high) => (None, Some(low_value), Some(high)),
        None => (Some(low_value), None, None),
    };

    Some(RunwayVisualRange {
        runway,
        visual_range,
        variable_low,
        variable_high,
        prefix,
        trend,
        cleared: false,
    })
}

pub(crate) fn parse_present_weather(token: &str) -> Option<PresentWeather> {
    if token == "NSW" {
        return Some(PresentWeather {
            code: token.to_string(),
            description: "No Significant Weather".to_string(),
        });
    }
    // The pattern admits a bare marker or an empty string; require a code.
    let marker_len = if token.starts_with(['+', '-']) {
        1
    } else if token.starts_with("VC") {
        2
    } else {
        0
    };
    if token.len() <= marker_len || !PRESENT_WEATHER.is_match(token) {
        return None;
    }
    Some(PresentWeather {
        code: token.to_string(),
        description: decode_weather(token),
    })
}

pub(crate) fn parse_sky_condition(token: &str) -> Option<SkyCondition> {
    let caps = SKY.captures(token)?;
    let coverage = SkyCoverage::from_code(&caps["cover"])?;

    let height_feet = if coverage.is_clear() {
        None
    } else {
        caps.name("height")
            .map(|h| h.as_str())
            .filter(|h| *h != "///")
            .and_then(|h| h.replace('O', "0").parse::<u32>().ok())
            .map(|hundreds| hundreds * 100)
    };
    let cloud_type = caps
        .name("cloud")
        .map(|c| c.as_str())
        .filter(|c| *c != "///")
        .map(String::from);

    Some(SkyCondition {
        coverage,
        height_feet,
        cloud_type,
    })
}

pub(crate) fn parse_temperature(token: &str) -> Option<Temperature> {
    let caps = TEMPERATURE.captures(token)?;
    let signed = |sign: Option<regex::Match<'_>>, digits: &str| -> Option<f64> {
        let value: f64 = digits.parse().ok()?;
        Some(if sign.is_some() { -value } else { value })
    };

    Some(Temperature {
        celsius: signed(caps.name("tsign"), &caps["temp"])?,
        dewpoint_celsius: caps.name("dew").and_then(|d| signed(caps.name("dsign"), d.as_str())),
    })
}

pub(crate) fn parse_pressure(token: &str) -> Option<Pressure> {
    let caps = PRESSURE.captures(token)?;
    let value: u32 = caps["value"].replace('O', "0").parse().ok()?;

    let pressure = match &caps["unit"] {
        "A" => Pressure {
            value: f64::from(value) / 100.0,
            unit: PressureUnit::InchesHg,
        },
        _ => Pressure {
            value: f64::from(value),
            unit: PressureUnit::Hectopascals,
        },
    };
    Some(pressure)
}

/// All-slash groups stand for values the station could not report.
pub(crate) fn is_missing(token: &str) -> bool {
    MISSING.is_match(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn issue_prefix_is_stripped() {
        let (issue, rest) = strip_issue_prefix("2024/01/15 18:51\nKJFK 151851Z");
        assert_eq!(issue, Some(at(2024, 1, 15, 18, 51)));
        assert_eq!(rest, "KJFK 151851Z");
    }

    #[test]
    fn invalid_issue_prefix_is_stripped_without_time() {
        let (issue, rest) = strip_issue_prefix("2024/13/45 18:51 METAR KJFK");
        assert_eq!(issue, None);
        assert_eq!(rest, "METAR KJFK");
    }

    #[test]
    fn instant_before_wraps_to_previous_month_and_year() {
        let reference = at(2024, 1, 2, 0, 30);
        assert_eq!(instant_before(reference, 31, 23, 50), Some(at(2023, 12, 31, 23, 50)));
        assert_eq!(instant_before(reference, 1, 12, 0), Some(at(2024, 1, 1, 12, 0)));
    }

    #[test]
    fn instant_after_handles_hour_24_and_next_month() {
        let anchor = at(2024, 1, 31, 17, 20);
        assert_eq!(instant_after(anchor, 31, 24, 0), Some(at(2024, 2, 1, 0, 0)));
        assert_eq!(instant_after(anchor, 1, 6, 0), Some(at(2024, 2, 1, 6, 0)));
    }

    #[test]
    fn wind_groups() {
        let wind = parse_wind("28015G25KT").unwrap();
        assert_eq!(wind.direction_degrees, Some(280));
        assert_eq!(wind.speed, Some(15));
        assert_eq!(wind.gust, Some(25));
        assert_eq!(wind.unit, "KT");

        let vrb = parse_wind("VRB03MPS").unwrap();
        assert!(vrb.variable);
        assert_eq!(vrb.direction_degrees, None);

        assert!(parse_wind("28015").is_none());
    }

    #[test]
    fn variation_attaches_to_wind() {
        let mut conditions = WeatherConditions::default();
        assert_eq!(take_condition(&["28015KT", "250V310"], &mut conditions), 1);
        assert_eq!(take_condition(&["250V310"], &mut conditions), 1);
        let wind = conditions.wind.unwrap();
        assert_eq!((wind.variable_from, wind.variable_to), (Some(250), Some(310)));
    }

    #[test]
    fn visibility_groups() {
        let (vis, used) = parse_visibility(&["10SM"]).unwrap();
        assert_eq!((vis.distance, vis.unit.as_deref(), used), (Some(10.0), Some("SM"), 1));

        let (vis, used) = parse_visibility(&["1", "1/2SM", "BR"]).unwrap();
        assert_eq!((vis.distance, used), (Some(1.5), 2));

        let (vis, _) = parse_visibility(&["M1/4SM"]).unwrap();
        assert!(vis.less_than);
        assert_eq!(vis.distance, Some(0.25));

        let (vis, _) = parse_visibility(&["9999"]).unwrap();
        assert_eq!((vis.distance, vis.unit.as_deref()), (Some(9999.0), Some("M")));

        assert!(parse_visibility(&["CAVOK"]).unwrap().0.cavok);
        assert!(parse_visibility(&["1", "BKN020"]).is_none());
    }

    #[test]
    fn runway_visual_range_groups() {
        let rvr = parse_runway_visual_range("R04R/2200FT").unwrap();
        assert_eq!(rvr.runway, "04R");
        assert_eq!(rvr.visual_range, Some(2200));

        let rvr = parse_runway_visual_range("R22L/M0600V1000FT/U").unwrap();
        assert_eq!((rvr.variable_low, rvr.variable_high), (Some(600), Some(1000)));
        assert_eq!(rvr.prefix.as_deref(), Some("M"));
        assert_eq!(rvr.trend.as_deref(), Some("U"));

        assert!(parse_runway_visual_range("R09/CLRD").unwrap().cleared);
    }

    #[test]
    fn present_weather_groups() {
        assert_eq!(parse_present_weather("-SHRA").unwrap().description, "Light Shower(s) Rain");
        assert_eq!(
            parse_present_weather("VCTS").unwrap().description,
            "Thunderstorm In the Vicinity"
        );
        assert_eq!(parse_present_weather("NSW").unwrap().description, "No Significant Weather");
        assert!(parse_present_weather("+").is_none());
        assert!(parse_present_weather("KJFK").is_none());
        assert!(parse_present_weather("A2992").is_none());
    }

    #[test]
    fn sky_groups() {
        let sky = parse_sky_condition("BKN025CB").unwrap();
        assert_eq!(sky.coverage, SkyCoverage::Broken);
        assert_eq!(sky.height_feet, Some(2500));
        assert_eq!(sky.cloud_type.as_deref(), Some("CB"));

        let clear = parse_sky_condition("SKC").unwrap();
        assert_eq!(clear.height_feet, None);

        let vv = parse_sky_condition("VV002").unwrap();
        assert_eq!((vv.coverage, vv.height_feet), (SkyCoverage::VerticalVisibility, Some(200)));

        assert!(parse_sky_condition("FEW///").unwrap().height_feet.is_none());
    }

    #[test]
    fn temperature_groups() {
        let t = parse_temperature("M05/M10").unwrap();
        assert_eq!((t.celsius, t.dewpoint_celsius), (-5.0, Some(-10.0)));

        let t = parse_temperature("22/").unwrap();
        assert_eq!(t.dewpoint_celsius, None);

        assert!(parse_temperature("1518/1624").is_none());
    }

    #[test]
    fn pressure_groups() {
        let p = parse_pressure("A2992").unwrap();
        assert_eq!((p.value, p.unit), (29.92, PressureUnit::InchesHg));
        let q = parse_pressure("Q1013").unwrap();
        assert_eq!((q.value, q.unit), (1013.0, PressureUnit::Hectopascals));
    }

    #[test]
    fn missing_groups() {
        assert!(is_missing("////"));
        assert!(is_missing("/////KT"));
        assert!(!is_missing("A2992"));
    }
}
