use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Confirm, Select, Text};
use tracing::debug;
use wxdecode_core::{
    Config, DataSource, ParseOutcome, ParserRegistry, WeatherReport, decoder, split_reports,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxdecode", version, about = "Decode METAR/TAF reports and ICAO weather codes")]
pub struct Cli {
    /// Log filter, e.g. "debug" or "wxdecode_core=trace". Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a single weather code into plain English.
    Decode {
        /// Code to decode, e.g. "+TSRA" or "BKN".
        code: String,

        /// Which code table to use.
        #[arg(long, value_enum, default_value_t = CodeKind::Weather)]
        kind: CodeKind,
    },

    /// Parse full reports. Reads a NOAA bulletin from --file or stdin when
    /// REPORT is omitted.
    Parse {
        report: Option<String>,

        /// Source hint, e.g. "noaa". Without one, the format is auto-detected.
        #[arg(long)]
        source: Option<String>,

        #[arg(long, conflicts_with = "report")]
        file: Option<PathBuf>,

        /// Print outcomes as JSON instead of summaries.
        #[arg(long)]
        json: bool,
    },

    /// List registered parsers in probing order.
    Parsers,

    /// Interactively edit the config file.
    Configure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CodeKind {
    Weather,
    Sky,
    Phenomenon,
    Intensity,
    Descriptor,
    Cloud,
}

impl CodeKind {
    fn decode(self, code: &str) -> String {
        match self {
            CodeKind::Weather => decoder::decode_weather(code),
            CodeKind::Sky => decoder::decode_sky_coverage(code),
            CodeKind::Phenomenon => decoder::decode_weather_phenomenon(code),
            CodeKind::Intensity => decoder::decode_intensity(code),
            CodeKind::Descriptor => decoder::decode_descriptor(code),
            CodeKind::Cloud => decoder::decode_cloud_type(code),
        }
    }
}

impl Cli {
    pub fn run(self, config: Config) -> Result<()> {
        match self.command {
            Command::Decode { code, kind } => {
                let phrase = kind.decode(&code);
                if phrase.is_empty() {
                    bail!("'{code}' is not a known {kind:?} code");
                }
                println!("{phrase}");
            }
            Command::Parse {
                report,
                source,
                file,
                json,
            } => {
                let source = match source {
                    Some(name) => Some(name.parse::<DataSource>()?),
                    None => config.default_source()?,
                };
                let registry = ParserRegistry::with_config(&config);
                debug!(?source, strict = config.strict_mode, "Parsing reports");

                match report {
                    Some(report) => parse_one(&registry, &report, source, json)?,
                    None => parse_many(&registry, file, source, json)?,
                }
            }
            Command::Parsers => {
                let registry = ParserRegistry::with_config(&config);
                for key in registry.keys_in_order() {
                    println!("{key}");
                }
            }
            Command::Configure => configure(config)?,
        }

        Ok(())
    }
}

fn dispatch(
    registry: &ParserRegistry,
    raw: &str,
    source: Option<DataSource>,
) -> ParseOutcome<WeatherReport> {
    match source {
        Some(source) => registry.parse(raw, source),
        None => registry.parse_auto(raw),
    }
}

fn parse_one(
    registry: &ParserRegistry,
    raw: &str,
    source: Option<DataSource>,
    json: bool,
) -> Result<()> {
    let outcome = dispatch(registry, raw, source);
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    match outcome {
        ParseOutcome::Success { data } => {
            if !json {
                println!("{}", data.summary());
            }
            Ok(())
        }
        ParseOutcome::Failure { message } => bail!(message),
    }
}

fn parse_many(
    registry: &ParserRegistry,
    file: Option<PathBuf>,
    source: Option<DataSource>,
    json: bool,
) -> Result<()> {
    let text = match &file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => io::read_to_string(io::stdin()).context("Failed to read reports from stdin")?,
    };

    let reports = split_reports(&text);
    let summary = registry.parse_batch(reports.iter().map(String::as_str), source);
    for (raw, outcome) in reports.iter().zip(&summary.outcomes) {
        if json {
            println!("{}", serde_json::to_string(outcome)?);
            continue;
        }
        match outcome {
            ParseOutcome::Success { data } => println!("{}", data.summary()),
            ParseOutcome::Failure { message } => eprintln!("error: {message}\n  in: {raw}"),
        }
    }

    eprintln!("{} succeeded, {} failed", summary.succeeded, summary.failed);
    Ok(())
}

fn configure(mut config: Config) -> Result<()> {
    const AUTO: &str = "auto-detect";

    let mut options = vec![AUTO];
    options.extend(DataSource::all().iter().map(|s| s.display_name()));
    let current = config
        .default_source()
        .ok()
        .flatten()
        .and_then(|s| DataSource::all().iter().position(|o| *o == s))
        .map_or(0, |i| i + 1);

    let picked = Select::new("Default source:", options)
        .with_starting_cursor(current)
        .prompt()?;
    let source = DataSource::all().iter().copied().find(|s| s.display_name() == picked);
    config.set_default_source(source);

    config.strict_mode = Confirm::new("Reject reports with unrecognized groups?")
        .with_default(config.strict_mode)
        .prompt()?;

    let level = Text::new("Log level (blank for default):")
        .with_default(config.log_level.as_deref().unwrap_or(""))
        .prompt()?;
    config.log_level = Some(level.trim().to_string()).filter(|l| !l.is_empty());

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}
