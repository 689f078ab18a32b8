//! Routing of raw report text to registered [`ReportParser`]s.

use std::{
    collections::BTreeSet,
    fmt,
    sync::{Arc, PoisonError, RwLock},
};

use tracing::debug;

use crate::{
    Config, DataSource, ParseOutcome, WeatherReport,
    error::RegistryError,
    parser::{ReportParser, default_parsers, groups, metar, taf},
};

#[derive(Clone)]
struct Registration {
    key: String,
    parser: Arc<dyn ReportParser>,
}

type Snapshot = Arc<Vec<Registration>>;

/// Key -> parser mapping with first-registered-first-probed ordering.
///
/// Writers build a new snapshot and swap it in; readers take the current
/// snapshot and release the lock before any parser runs, so a parse never
/// observes a half-applied registration.
pub struct ParserRegistry {
    registrations: RwLock<Snapshot>,
}

impl ParserRegistry {
    /// Registry seeded with the METAR and TAF parsers.
    pub fn new() -> Self {
        Self::seeded(default_parsers(false))
    }

    /// Registry seeded with defaults configured from `config`.
    pub fn with_config(config: &Config) -> Self {
        Self::seeded(default_parsers(config.strict_mode))
    }

    /// Registry with no parsers at all.
    pub fn empty() -> Self {
        Self {
            registrations: RwLock::new(Arc::new(Vec::new())),
        }
    }

    fn seeded(parsers: Vec<Arc<dyn ReportParser>>) -> Self {
        let registrations = parsers
            .into_iter()
            .map(|parser| Registration {
                key: parser.source_type().to_string(),
                parser,
            })
            .collect();
        Self {
            registrations: RwLock::new(Arc::new(registrations)),
        }
    }

    fn snapshot(&self) -> Snapshot {
        // Snapshots are swapped whole, so a poisoned lock still guards a
        // consistent value.
        self.registrations.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update<R>(&self, f: impl FnOnce(&mut Vec<Registration>) -> R) -> R {
        let mut guard = self.registrations.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = guard.as_ref().clone();
        let result = f(&mut next);
        *guard = Arc::new(next);
        result
    }

    /// Insert or replace the parser for `key`. A replaced parser keeps its
    /// original position in probing order.
    pub fn register_parser(
        &self,
        key: &str,
        parser: Arc<dyn ReportParser>,
    ) -> Result<(), RegistryError> {
        if key.trim().is_empty() {
            return Err(RegistryError::InvalidArgument(
                "Parser type cannot be null or empty".to_string(),
            ));
        }

        self.update(|regs| match regs.iter_mut().find(|r| r.key == key) {
            Some(existing) => {
                debug!(key, "Replacing registered parser");
                existing.parser = parser;
            }
            None => {
                debug!(key, "Registering parser");
                regs.push(Registration {
                    key: key.to_string(),
                    parser,
                });
            }
        });
        Ok(())
    }

    /// Returns whether a parser was removed.
    pub fn unregister_parser(&self, key: &str) -> bool {
        self.update(|regs| {
            let before = regs.len();
            regs.retain(|r| r.key != key);
            regs.len() != before
        })
    }

    pub fn has_parser(&self, key: &str) -> bool {
        self.snapshot().iter().any(|r| r.key == key)
    }

    pub fn parser_count(&self) -> usize {
        self.snapshot().len()
    }

    pub fn registered_keys(&self) -> BTreeSet<String> {
        self.snapshot().iter().map(|r| r.key.clone()).collect()
    }

    /// Keys in probing order.
    pub fn keys_in_order(&self) -> Vec<String> {
        self.snapshot().iter().map(|r| r.key.clone()).collect()
    }

    /// Parse with the parser selected by `source`.
    pub fn parse(&self, raw: &str, source: DataSource) -> ParseOutcome<WeatherReport> {
        let key = resolve_key(raw, source);
        let parser = self
            .snapshot()
            .iter()
            .find(|r| r.key == key)
            .map(|r| Arc::clone(&r.parser));

        match parser {
            Some(parser) => {
                debug!(%source, %key, "Dispatching to registered parser");
                parser.parse(raw)
            }
            None => ParseOutcome::failure(format!(
                "No parser registered for source: {source} (parser type: {key})"
            )),
        }
    }

    /// Parse with the first registered parser that claims `raw`.
    ///
    /// Only that parser is tried: if it then fails, its failure is returned.
    pub fn parse_auto(&self, raw: &str) -> ParseOutcome<WeatherReport> {
        if raw.trim().is_empty() {
            return ParseOutcome::failure("Raw data cannot be null or empty");
        }

        let snapshot = self.snapshot();
        match snapshot.iter().find(|r| r.parser.can_parse(raw)) {
            Some(r) => {
                debug!(key = %r.key, "Auto-detected parser");
                r.parser.parse(raw)
            }
            None => {
                let keys: Vec<&str> = snapshot.iter().map(|r| r.key.as_str()).collect();
                ParseOutcome::failure(format!(
                    "No parser could handle the provided data. Registered parsers: {}",
                    keys.join(", ")
                ))
            }
        }
    }

    /// Parse every report independently; one bad report does not stop the
    /// rest. `None` selects auto-detection.
    pub fn parse_batch<'a, I>(&self, reports: I, source: Option<DataSource>) -> BatchSummary
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut summary = BatchSummary::default();
        for raw in reports {
            let outcome = match source {
                Some(source) => self.parse(raw, source),
                None => self.parse_auto(raw),
            };
            if outcome.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            summary.outcomes.push(outcome);
        }
        debug!(succeeded = summary.succeeded, failed = summary.failed, "Batch parsed");
        summary
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("keys", &self.keys_in_order())
            .finish()
    }
}

/// Outcomes of [`ParserRegistry::parse_batch`], in input order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<ParseOutcome<WeatherReport>>,
    pub succeeded: usize,
    pub failed: usize,
}

/// Group NOAA bulletin text into one string per report.
///
/// An issue-date line attaches to the report below it, and indented lines
/// continue the report above them, as TAF change groups do. Blank lines
/// separate reports.
pub fn split_reports(text: &str) -> Vec<String> {
    let mut reports: Vec<String> = Vec::new();
    let mut pending_issue: Option<&str> = None;
    let mut open = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            open = false;
        } else if groups::is_issue_line(trimmed) {
            reports.extend(pending_issue.replace(trimmed).map(str::to_string));
            open = false;
        } else if open && line.starts_with(char::is_whitespace) {
            if let Some(last) = reports.last_mut() {
                last.push(' ');
                last.push_str(trimmed);
            }
        } else {
            reports.push(match pending_issue.take() {
                Some(issue) => format!("{issue}\n{trimmed}"),
                None => trimmed.to_string(),
            });
            open = true;
        }
    }
    reports.extend(pending_issue.map(str::to_string));
    reports
}

/// Registry key for `raw` arriving from `source`.
///
/// NOAA publishes several report kinds; the leading keyword (after any issue
/// date line) picks between them, defaulting to METAR. Other sources use
/// their own name as the key.
pub fn resolve_key(raw: &str, source: DataSource) -> &'static str {
    match source {
        DataSource::Noaa => {
            let (_, body) = groups::strip_issue_prefix(raw.trim());
            if body.starts_with("TAF") { taf::SOURCE_TYPE } else { metar::SOURCE_TYPE }
        }
        other => other.name(),
    }
}
