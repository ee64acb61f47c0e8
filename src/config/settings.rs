//! Application settings loaded from `config.toml`.
//!
//! Every section is optional; missing values fall back to the defaults the
//! tracker ships with.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Storage namespace settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Alerting and session policy
    #[serde(default)]
    pub policy: PolicyConfig,
}

/// Storage namespace used to derive the four table keys
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Prefix for every storage key
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

/// Tunables for seeding and the session liveness check
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    /// Alert window applied to freshly seeded regions
    #[serde(default = "default_alert_days")]
    pub default_alert_days: i64,
    /// Seconds between session liveness checks
    #[serde(default = "default_session_check_interval")]
    pub session_check_interval_secs: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_alert_days: default_alert_days(),
            session_check_interval_secs: default_session_check_interval(),
        }
    }
}

impl PolicyConfig {
    /// Rejects values the session monitor cannot run with.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when the liveness interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.session_check_interval_secs == 0 {
            return Err(Error::Config {
                message: "policy.session_check_interval_secs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Liveness polling interval as a `Duration`.
    #[must_use]
    pub const fn session_check_interval(&self) -> Duration {
        Duration::from_secs(self.session_check_interval_secs)
    }
}

fn default_namespace() -> String {
    "detran_app".to_string()
}

const fn default_alert_days() -> i64 {
    30
}

const fn default_session_check_interval() -> u64 {
    2
}

impl AppConfig {
    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    /// Returns [`Error::Config`] on invalid syntax or out-of-range values.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse configuration: {e}"),
        })?;
        config.policy.validate()?;
        Ok(config)
    }
}

/// Loads the application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A policy value is out of range
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    AppConfig::from_toml_str(&contents).map_err(|e| match e {
        Error::Config { message } => Error::Config {
            message: format!("{}: {message}", path_ref.display()),
        },
        other => other,
    })
}

/// Loads `./config.toml`, or the defaults when the file is absent.
pub fn load_default_config() -> Result<AppConfig> {
    let path = Path::new("config.toml");
    if path.exists() {
        load_config(path)
    } else {
        info!("No config.toml found, using default settings");
        Ok(AppConfig::default())
    }
}
