//! Core library for the `wxdecode` CLI.
//!
//! This crate defines:
//! - ICAO weather code tables and the phrase decoder built on them
//! - METAR and TAF report parsers behind a common trait
//! - A registry that routes raw report text to the right parser
//!
//! It is used by `wxdecode-cli`, but can also be reused by other binaries or services.

pub mod codes;
pub mod config;
pub mod decoder;
pub mod error;
pub mod model;
pub mod outcome;
pub mod parser;
pub mod registry;
pub mod source;

pub use config::Config;
pub use error::{ParseError, RegistryError};
pub use model::{MetarReport, TafReport, WeatherReport};
pub use outcome::ParseOutcome;
pub use parser::{MetarParser, ReportParser, TafParser};
pub use registry::{BatchSummary, ParserRegistry, split_reports};
pub use source::DataSource;
