//! Settings file for the `sqled` binary

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqled_core::ConnectionConfig;
use sqled_services::BuilderSettings;

/// Contents of `settings.toml`; every table is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub connection: ConnectionConfig,
    pub builder: BuilderSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter used when `RUST_LOG` is unset
    pub filter: String,
    /// Write JSON logs to daily files
    pub json_file: bool,
    /// Directory for log files (defaults to the local data dir)
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "warn,sqled_cli=info,sqled_services=info,sqled_table_builder=info,sqled_driver_mysql=info"
                .to_string(),
            json_file: false,
            directory: None,
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .context("Could not determine config directory")
        .map(|p| p.join("sqled"))
}

pub fn settings_file() -> Result<PathBuf> {
    config_dir().map(|p| p.join("settings.toml"))
}

impl Settings {
    /// Load settings from `path`, or from the default location.
    ///
    /// A missing default file yields default settings; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (settings_file()?, false),
        };

        if !path.exists() {
            if required {
                anyhow::bail!("Settings file not found: {}", path.display());
            }
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid settings file: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
