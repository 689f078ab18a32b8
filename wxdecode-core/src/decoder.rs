//! Decoding of ICAO weather codes into human-readable text.
//!
//! All functions are pure. Single-code decoders echo unknown codes back,
//! except [`decode_intensity`] which returns an empty string for them.

use crate::codes::{CodeCategory, IN_THE_VICINITY};

/// Decode a sky coverage code, e.g. `"BKN"` -> `"Broken"`.
pub fn decode_sky_coverage(code: &str) -> String {
    decode_with_echo(CodeCategory::SkyCoverage, code)
}

/// Decode a weather phenomenon code, e.g. `"RA"` -> `"Rain"`.
pub fn decode_weather_phenomenon(code: &str) -> String {
    decode_with_echo(CodeCategory::WeatherPhenomenon, code)
}

/// Decode a descriptor code, e.g. `"SH"` -> `"Shower(s)"`.
pub fn decode_descriptor(code: &str) -> String {
    decode_with_echo(CodeCategory::Descriptor, code)
}

/// Decode a cloud type code, e.g. `"TCU"` -> `"Towering Cumulus"`.
pub fn decode_cloud_type(code: &str) -> String {
    decode_with_echo(CodeCategory::CloudType, code)
}

/// Decode an intensity or proximity marker (`"+"`, `"-"`, `"VC"`).
///
/// Markers are matched case-sensitively and unknown markers decode to an
/// empty string rather than being echoed.
pub fn decode_intensity(code: &str) -> String {
    if code.trim().is_empty() {
        return String::new();
    }
    CodeCategory::Intensity
        .lookup(code.trim())
        .unwrap_or_default()
        .to_string()
}

fn decode_with_echo(category: CodeCategory, code: &str) -> String {
    if code.trim().is_empty() {
        return String::new();
    }
    let normalized = code.trim().to_uppercase();
    match category.lookup(&normalized) {
        Some(description) => description.to_string(),
        None => code.to_string(),
    }
}

/// Decode a complete present-weather group such as `"+TSRAGR"`.
///
/// The group is read as: one optional leading marker, then descriptors, then
/// phenomena, each consumed greedily two characters at a time. A leading `VC`
/// is rendered after the phenomena. Whatever cannot be decoded is appended
/// verbatim.
///
/// ```
/// use wxdecode_core::decoder::decode_weather;
///
/// assert_eq!(decode_weather("-SHRA"), "Light Shower(s) Rain");
/// assert_eq!(decode_weather("VCFG"), "Fog In the Vicinity");
/// ```
pub fn decode_weather(weather_code: &str) -> String {
    let normalized = weather_code.trim().to_uppercase();
    if normalized.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    let mut remaining = normalized.as_str();
    let mut vicinity = false;

    if let Some(rest) = remaining.strip_prefix('+') {
        out.push_str("Heavy ");
        remaining = rest;
    } else if let Some(rest) = remaining.strip_prefix('-') {
        out.push_str("Light ");
        remaining = rest;
    } else if let Some(rest) = remaining.strip_prefix("VC") {
        vicinity = true;
        remaining = rest;
    }

    remaining = consume_codes(remaining, CodeCategory::Descriptor, &mut out);
    remaining = consume_codes(remaining, CodeCategory::WeatherPhenomenon, &mut out);

    if vicinity {
        out.push_str(IN_THE_VICINITY);
    }
    out.push_str(remaining);

    out.trim_end().to_string()
}

/// Greedily take two-character codes from the front of `input` while they
/// are present in `category`. Returns the unconsumed rest.
fn consume_codes<'a>(input: &'a str, category: CodeCategory, out: &mut String) -> &'a str {
    let mut current = input;
    while let Some(head) = current.get(..2) {
        let Some(description) = category.lookup(head) else {
            break;
        };
        out.push_str(description);
        out.push(' ');
        current = &current[2..];
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{CLOUD_TYPES, DESCRIPTORS, SKY_COVERAGE, WEATHER_PHENOMENA};

    #[test]
    fn every_table_code_decodes_to_its_description() {
        for (code, description) in SKY_COVERAGE {
            assert_eq!(decode_sky_coverage(code), *description);
        }
        for (code, description) in WEATHER_PHENOMENA {
            assert_eq!(decode_weather_phenomenon(code), *description);
        }
        for (code, description) in DESCRIPTORS {
            assert_eq!(decode_descriptor(code), *description);
        }
        for (code, description) in CLOUD_TYPES {
            assert_eq!(decode_cloud_type(code), *description);
        }
    }

    #[test]
    fn single_code_decoders_normalize_input() {
        assert_eq!(decode_sky_coverage(" bkn "), "Broken");
        assert_eq!(decode_weather_phenomenon("ra"), "Rain");
        assert_eq!(decode_descriptor(" fz"), "Freezing");
        assert_eq!(decode_cloud_type("tcu"), "Towering Cumulus");
    }

    #[test]
    fn unknown_codes_are_echoed() {
        assert_eq!(decode_sky_coverage("XYZ"), "XYZ");
        assert_eq!(decode_weather_phenomenon("QQ"), "QQ");
        assert_eq!(decode_descriptor("zz"), "zz");
        assert_eq!(decode_cloud_type("ABC"), "ABC");
    }

    #[test]
    fn blank_codes_decode_to_empty() {
        for decode in [
            decode_sky_coverage,
            decode_weather_phenomenon,
            decode_descriptor,
            decode_cloud_type,
            decode_intensity,
            decode_weather,
        ] {
            assert_eq!(decode(""), "");
            assert_eq!(decode("   "), "");
        }
    }

    #[test]
    fn intensity_decodes_known_markers() {
        assert_eq!(decode_intensity("+"), "Heavy");
        assert_eq!(decode_intensity("-"), "Light");
        assert_eq!(decode_intensity(" VC "), "In the Vicinity");
    }

    #[test]
    fn intensity_does_not_echo_unknown_markers() {
        assert_eq!(decode_intensity("vc"), "");
        assert_eq!(decode_intensity("RA"), "");
        assert_eq!(decode_intensity("++"), "");
    }

    #[test]
    fn composite_weather_groups() {
        assert_eq!(decode_weather("-RA"), "Light Rain");
        assert_eq!(decode_weather("+TSRA"), "Heavy Thunderstorm Rain");
        assert_eq!(decode_weather("VCFG"), "Fog In the Vicinity");
        assert_eq!(decode_weather("FZRA"), "Freezing Rain");
        assert_eq!(decode_weather("-SHRA"), "Light Shower(s) Rain");
        assert_eq!(decode_weather("BLSN"), "Blowing Snow");
        assert_eq!(decode_weather("+TSRAGR"), "Heavy Thunderstorm Rain Hail");
    }

    #[test]
    fn vicinity_is_emitted_after_descriptors_and_phenomena() {
        assert_eq!(decode_weather("VCSH"), "Shower(s) In the Vicinity");
        assert_eq!(decode_weather("VCTSRA"), "Thunderstorm Rain In the Vicinity");
    }

    #[test]
    fn composite_weather_is_case_insensitive() {
        assert_eq!(decode_weather(" -shra "), "Light Shower(s) Rain");
    }

    #[test]
    fn undecodable_tail_is_appended_verbatim() {
        assert_eq!(decode_weather("RAXX"), "Rain XX");
        assert_eq!(decode_weather("-RAX"), "Light Rain X");
        assert_eq!(decode_weather("QQ"), "QQ");
        assert_eq!(decode_weather("VCQQ"), "In the VicinityQQ");
    }

    #[test]
    fn phenomenon_before_descriptor_is_not_reordered() {
        // RA fails the descriptor pass, is taken by the phenomena pass, and
        // SH is then left over since descriptors are never revisited.
        assert_eq!(decode_weather("RASH"), "Rain SH");
    }

    #[test]
    fn only_one_leading_marker_is_stripped() {
        assert_eq!(decode_weather("+-RA"), "Heavy -RA");
    }

    #[test]
    fn non_ascii_tail_does_not_panic() {
        assert_eq!(decode_weather("RAé"), "Rain É");
    }

    #[test]
    fn decoding_is_repeatable() {
        let first = decode_weather("+TSRAGR");
        let second = decode_weather("+TSRAGR");
        assert_eq!(first, second);
    }
}
