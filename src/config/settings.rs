//! Application settings loading from config.toml
//!
//! Settings are optional: a missing file yields the defaults below, while a file that
//! exists but cannot be parsed is a hard configuration error. The path can be
//! overridden with the `NUMBERING_CONFIG` environment variable.

use crate::errors::{Error, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number allocation behaviour
    pub numbering: NumberingSettings,
    /// HTTP listener
    pub server: ServerSettings,
}

/// Settings for the number allocator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NumberingSettings {
    /// IANA timezone that defines the business day and the financial year
    pub timezone: Tz,
    /// Attempts per allocation before giving up on transient store errors
    pub max_attempts: u32,
    /// Base delay between attempts in milliseconds, multiplied by the attempt number
    pub retry_backoff_ms: u64,
}

impl Default for NumberingSettings {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Kolkata,
            max_attempts: 5,
            retry_backoff_ms: 25,
        }
    }
}

impl NumberingSettings {
    /// Base retry delay as a [`Duration`]
    #[must_use]
    pub const fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Settings for the HTTP server
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address to listen on
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Settings {
    /// Checks values that parse fine but cannot be used
    fn validate(self) -> Result<Self> {
        if self.numbering.max_attempts == 0 {
            return Err(Error::Config {
                message: "numbering.max_attempts must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}

/// Parses settings from TOML text
///
/// # Errors
/// Returns an error if the TOML syntax is invalid, the timezone is unknown,
/// or `max_attempts` is zero.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    settings.validate()
}

/// Loads settings from a TOML file, falling back to defaults if the file is absent
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!("No settings file at {:?}, using defaults", path);
        return Ok(Settings::default());
    }

    tracing::debug!("Loading settings from {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `NUMBERING_CONFIG` or ./config.toml
pub fn load_default_settings() -> Result<Settings> {
    let path =
        std::env::var("NUMBERING_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_settings(path)
}
