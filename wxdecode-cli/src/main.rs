//! Binary crate for the `wxdecode` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Human-friendly output formatting

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use wxdecode_core::Config;

mod cli;

fn main() -> Result<()> {
    let cmd = cli::Cli::parse();
    let config = Config::load()?;
    init_logging(cmd.log_level.as_deref(), &config)?;

    cmd.run(config)
}

/// `--log-level` wins, then RUST_LOG, then the config file, then "warn".
fn init_logging(flag: Option<&str>, config: &Config) -> Result<()> {
    let filter = match flag {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config.log_level.as_deref().unwrap_or("warn")))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr).compact())
        .init();

    debug!(?flag, "Logging initialized");
    Ok(())
}
