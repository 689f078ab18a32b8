use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::DataSource;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_source = "noaa"
/// strict_mode = true
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Source hint used when none is given on the command line.
    /// Unset means auto-detection.
    pub default_source: Option<String>,

    /// Reject reports containing groups the parsers do not recognize.
    pub strict_mode: bool,

    /// `tracing` filter directive, e.g. "info" or "wxdecode_core=debug".
    pub log_level: Option<String>,
}

impl Config {
    /// The configured default source, if any.
    pub fn default_source(&self) -> Result<Option<DataSource>> {
        self.default_source
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.parse::<DataSource>().context(
                    "Invalid `default_source` in config.\n\
                     Hint: run `wxdecode configure` to pick a supported source.",
                )
            })
            .transpose()
    }

    pub fn set_default_source(&mut self, source: Option<DataSource>) {
        self.default_source = source.map(|s| s.name().to_lowercase());
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxdecode", "wxdecode-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
