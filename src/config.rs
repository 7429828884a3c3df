//! Session configuration
//!
//! A session is configured once, when the consumer creates it: broker
//! address, client identity, keepalive and the disconnect watchdog. Values
//! can come from a TOML file, from the console binary's flags, or be built
//! in code; missing fields fall back to the documented defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Quality-of-service level for subscribe and publish operations.
///
/// Mirrors the protocol's three delivery guarantees. Serialized as the raw
/// integer (`0`, `1`, `2`) so config files and CLI flags stay familiar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum QosLevel {
    /// At most once (fire and forget)
    #[default]
    AtMostOnce,
    /// At least once (acknowledged delivery)
    AtLeastOnce,
    /// Exactly once (assured delivery)
    ExactlyOnce,
}

impl TryFrom<u8> for QosLevel {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(QosLevel::AtMostOnce),
            1 => Ok(QosLevel::AtLeastOnce),
            2 => Ok(QosLevel::ExactlyOnce),
            other => Err(ConfigError::InvalidConfig(format!(
                "qos must be 0, 1 or 2, got {other}"
            ))),
        }
    }
}

impl From<QosLevel> for u8 {
    fn from(qos: QosLevel) -> u8 {
        match qos {
            QosLevel::AtMostOnce => 0,
            QosLevel::AtLeastOnce => 1,
            QosLevel::ExactlyOnce => 2,
        }
    }
}

impl std::fmt::Display for QosLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Configuration for one broker session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Broker host name or IP address (no scheme, no port)
    pub broker_host: String,
    /// Broker TCP port (default: 1883)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Client identifier; auto-generated when absent
    #[serde(default)]
    pub client_id: Option<String>,
    /// Keepalive interval in seconds (default: 60)
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    /// QoS applied when the consumer does not pick one (default: 0)
    #[serde(default)]
    pub default_qos: QosLevel,
    /// Watchdog timeout for a requested disconnect in seconds (default: 5)
    #[serde(default = "default_disconnect_timeout_secs")]
    pub disconnect_timeout_secs: u64,
}

fn default_port() -> u16 {
    1883
}

fn default_keepalive_secs() -> u64 {
    60
}

fn default_disconnect_timeout_secs() -> u64 {
    5
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid broker address: {0}")]
    InvalidBrokerAddress(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SessionConfig {
    /// Build a configuration with defaults for everything but the host.
    pub fn new(broker_host: impl Into<String>) -> Self {
        Self {
            broker_host: broker_host.into(),
            port: default_port(),
            client_id: None,
            keepalive_secs: default_keepalive_secs(),
            default_qos: QosLevel::default(),
            disconnect_timeout_secs: default_disconnect_timeout_secs(),
        }
    }

    /// Load configuration from a TOML file and validate it.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: SessionConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let host = self.broker_host.trim();
        if host.is_empty() {
            return Err(ConfigError::InvalidBrokerAddress(
                "broker_host must not be empty".to_string(),
            ));
        }
        if host.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidBrokerAddress(format!(
                "broker_host must not contain whitespace: {host:?}"
            )));
        }
        if host.contains("://") {
            return Err(ConfigError::InvalidBrokerAddress(format!(
                "broker_host takes a bare host, not a URL: {host:?}"
            )));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "port must be non-zero".to_string(),
            ));
        }
        if self.keepalive_secs < 5 {
            return Err(ConfigError::InvalidConfig(format!(
                "keepalive_secs must be at least 5, got {}",
                self.keepalive_secs
            )));
        }
        if self.disconnect_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "disconnect_timeout_secs must be non-zero".to_string(),
            ));
        }
        if let Some(id) = &self.client_id {
            if id.is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "client_id must not be empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Client identifier to present to the broker.
    ///
    /// When none was configured, a fresh identifier is generated per call so
    /// two sessions from the same config never collide on the broker.
    pub fn effective_client_id(&self) -> String {
        match &self.client_id {
            Some(id) => id.clone(),
            None => format!("session-{}", uuid::Uuid::new_v4().simple()),
        }
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn disconnect_timeout(&self) -> Duration {
        Duration::from_secs(self.disconnect_timeout_secs)
    }
}
