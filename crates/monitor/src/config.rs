//! Monitor configuration
//!
//! Layered with the `config` crate: optional TOML file, then environment
//! variables such as `DROWSY__NOTIFICATIONS__TELEGRAM__BOT_TOKEN`.

use actuator::ActuatorConfig;
use alerting::NotificationSettings;
use config::{Config, ConfigError, Environment, File, FileFormat};
use dms::DmsConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// File looked up (as `drowsiness.toml` etc.) when no path is given
pub const DEFAULT_CONFIG_NAME: &str = "drowsiness";

const ENV_PREFIX: &str = "DROWSY";

/// What to do with a frame where no face was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoFacePolicy {
    /// Treat as eyes open
    #[default]
    #[serde(rename = "open")]
    FailOpen,
    /// Skip the frame, leaving alarm timers untouched
    #[serde(rename = "hold")]
    Hold,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete monitor configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub detection: DmsConfig,
    pub no_face: NoFacePolicy,
    pub actuator: ActuatorConfig,
    pub notifications: NotificationSettings,
    pub logging: LoggingConfig,
    /// Serve Prometheus metrics on this address
    pub metrics_addr: Option<SocketAddr>,
}

impl MonitorConfig {
    /// Load from `path` (required) or the default file (optional), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Parse a TOML document on its own
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
