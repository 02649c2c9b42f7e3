//! Configuration management for badgeboard.
//!
//! Loaded with figment from defaults, a TOML file and environment
//! variables, then validated.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "config.toml";

const DATA_DIR_NAME: &str = "badgeboard";

const DATABASE_FILE_NAME: &str = "records.db";

/// Prefix for environment overrides; nested keys are joined with `__`,
/// e.g. `BADGEBOARD_ALERTS__EXPIRY_WARNING_DAYS=14`.
pub const ENV_PREFIX: &str = "BADGEBOARD_";

/// Application configuration.
///
/// Precedence, highest first:
/// 1. Environment variables (prefixed with `BADGEBOARD_`)
/// 2. TOML config file at `~/.config/badgeboard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Expiry notification configuration.
    pub alerts: AlertsConfig,
    /// Airport schedule configuration.
    pub airport: AirportConfig,
    /// Upload limits.
    pub attachments: AttachmentConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/badgeboard/records.db`
    pub database_path: Option<PathBuf>,
}

/// Expiry notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Records with at most this many days left (and more than zero) are reported.
    pub expiry_warning_days: i64,
    /// Addressee named in notification messages.
    pub recipient: Option<String>,
}

/// Airport schedule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AirportConfig {
    /// How many days ahead arrivals and departures are listed.
    pub window_days: i64,
}

/// Upload limits for scanned documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentConfig {
    /// Largest accepted upload.
    pub max_size_bytes: u64,
    /// Accepted MIME types.
    pub allowed_mime_types: Vec<String>,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            expiry_warning_days: 7,
            recipient: None,
        }
    }
}

impl Default for AirportConfig {
    fn default() -> Self {
        Self { window_days: 7 }
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: 10 * 1024 * 1024,
            allowed_mime_types: vec![
                "application/pdf".to_string(),
                "image/jpeg".to_string(),
                "image/png".to_string(),
            ],
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.alerts.expiry_warning_days < 1 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "alerts.expiry_warning_days must be at least 1, got {}",
                    self.alerts.expiry_warning_days
                ),
            });
        }

        if self.airport.window_days < 1 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "airport.window_days must be at least 1, got {}",
                    self.airport.window_days
                ),
            });
        }

        if self.attachments.max_size_bytes == 0 {
            return Err(Error::ConfigValidation {
                message: "attachments.max_size_bytes must be greater than 0".to_string(),
            });
        }

        for mime in &self.attachments.allowed_mime_types {
            if !matches!(mime.as_str(), "application/pdf" | "image/jpeg" | "image/png") {
                return Err(Error::ConfigValidation {
                    message: format!(
                        "unsupported MIME type in attachments.allowed_mime_types: {mime}"
                    ),
                });
            }
        }

        Ok(())
    }

    /// Database path, resolving the default if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }
}
