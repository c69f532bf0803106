// Serial defaults, motor limits and the optional JSON bus config
use serde::{Deserialize, Serialize};
use std::path::Path;

// Bus defaults for a factory-fresh AX-12 on a USB2Dynamixel-style adapter
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
pub const DEFAULT_BAUDRATE: u32 = 1_000_000;
pub const PROTOCOL_VERSION: f32 = 1.0;

// Read timeout for one status packet
pub const DEFAULT_TIMEOUT_MS: u64 = 100;

// Factory id
pub const DEFAULT_MOTOR_ID: u8 = 1;

// Range accepted by goal position, moving speed and torque limit
pub const MIN_GOAL_VAL: u16 = 0;
pub const MAX_GOAL_VAL: u16 = 1023;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Where the bus lives and how to talk to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub port: String,
    pub baudrate: u32,
    pub timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl BusConfig {
    /// Load from a JSON file; missing fields fall back to defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BusConfig::default();
        assert_eq!(config.port, "/dev/ttyUSB0");
        assert_eq!(config.baudrate, 1_000_000);
        assert_eq!(config.timeout_ms, 100);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BusConfig::from_json(r#"{ "port": "/dev/ttyACM0" }"#).unwrap();
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baudrate, DEFAULT_BAUDRATE);
    }

    #[test]
    fn test_bad_json_rejected() {
        assert!(BusConfig::from_json(r#"{ "baudrate": "fast" }"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = BusConfig::from_file("/nonexistent/ax12.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
