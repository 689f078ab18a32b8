use std::{fmt::Debug, sync::Arc};

use crate::{ParseOutcome, WeatherReport};

pub(crate) mod groups;
pub mod metar;
pub(crate) mod remarks;
pub mod taf;

pub use metar::MetarParser;
pub use taf::TafParser;

/// A decoder for one family of report text.
///
/// Implementations must not panic on malformed input: `can_parse` answers
/// `false` and `parse` answers with [`ParseOutcome::Failure`].
pub trait ReportParser: Send + Sync + Debug {
    /// Whether `raw` looks like this parser's syntax. A `true` answer does not
    /// promise that [`ReportParser::parse`] will succeed.
    fn can_parse(&self, raw: &str) -> bool;

    fn parse(&self, raw: &str) -> ParseOutcome<WeatherReport>;

    /// Stable, non-empty key this parser is registered under by default.
    fn source_type(&self) -> &str;
}

/// The parsers a fresh registry starts with, in registration order.
pub fn default_parsers(strict: bool) -> Vec<Arc<dyn ReportParser>> {
    vec![
        Arc::new(MetarParser::new().with_strict_mode(strict)),
        Arc::new(TafParser::new().with_strict_mode(strict)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_parsers_have_distinct_keys() {
        let parsers = default_parsers(false);
        let keys: Vec<_> = parsers.iter().map(|p| p.source_type().to_string()).collect();
        assert_eq!(keys, vec![metar::SOURCE_TYPE, taf::SOURCE_TYPE]);
    }

    #[test]
    fn default_parsers_claim_their_own_reports() {
        let parsers = default_parsers(false);
        assert!(parsers[0].can_parse("METAR KJFK 151851Z 28015KT 10SM FEW250 22/12 A2992"));
        assert!(!parsers[0].can_parse("TAF KJFK 151720Z 1518/1624 28015KT P6SM FEW250"));
        assert!(parsers[1].can_parse("TAF KJFK 151720Z 1518/1624 28015KT P6SM FEW250"));
        assert!(!parsers[1].can_parse("METAR KJFK 151851Z 28015KT"));
    }
}
