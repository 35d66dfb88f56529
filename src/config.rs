//! Adapter configuration
//!
//! Connection settings are handed to the executor untouched; the adapter
//! itself only reads `db`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config: {0}")]
    Read(String),

    /// Config file is not valid JSON for this schema
    #[error("Invalid config JSON: {0}")]
    Parse(String),

    /// A value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterConfig {
    /// Database host (default: "localhost")
    #[serde(default = "default_host")]
    pub host: String,

    /// Database port (default: 28015)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Authentication key (default: empty)
    #[serde(default, alias = "authKey")]
    pub auth_key: String,

    /// Default database name (default: "test")
    #[serde(default = "default_db")]
    pub db: String,

    /// Minimum pool size (default: 10)
    #[serde(default = "default_min")]
    pub min: u32,

    /// Maximum pool size (default: 50)
    #[serde(default = "default_max")]
    pub max: u32,

    /// Cursor buffer size (default: 10)
    #[serde(default = "default_buffer_size", alias = "bufferSize")]
    pub buffer_size: u32,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    28015
}

fn default_db() -> String {
    "test".to_string()
}

fn default_min() -> u32 {
    10
}

fn default_max() -> u32 {
    50
}

fn default_buffer_size() -> u32 {
    10
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            auth_key: String::new(),
            db: default_db(),
            min: default_min(),
            max: default_max(),
            buffer_size: default_buffer_size(),
        }
    }
}

impl AdapterConfig {
    /// Create a default config targeting the given database
    pub fn with_db(db: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            ..Default::default()
        }
    }

    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: AdapterConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.db.is_empty() {
            return Err(ConfigError::Invalid("db must not be empty".into()));
        }

        if self.max == 0 {
            return Err(ConfigError::Invalid("max must be > 0".into()));
        }

        if self.min > self.max {
            return Err(ConfigError::Invalid(format!(
                "min ({}) must not exceed max ({})",
                self.min, self.max
            )));
        }

        if self.buffer_size == 0 {
            return Err(ConfigError::Invalid("buffer_size must be > 0".into()));
        }

        Ok(())
    }

    /// Connection settings for the executor
    pub fn connection(&self) -> ConnectionSettings {
        ConnectionSettings {
            host: self.host.clone(),
            port: self.port,
            auth_key: self.auth_key.clone(),
            pool_min: self.min,
            pool_max: self.max,
            buffer_size: self.buffer_size,
        }
    }
}

/// Settings an executor needs to open its connection pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub auth_key: String,
    pub pool_min: u32,
    pub pool_max: u32,
    pub buffer_size: u32,
}

impl ConnectionSettings {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AdapterConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 28015);
        assert_eq!(config.auth_key, "");
        assert_eq!(config.db, "test");
        assert_eq!((config.min, config.max, config.buffer_size), (10, 50, 10));
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = AdapterConfig::from_json("{}").unwrap();
        assert_eq!(config, AdapterConfig::default());
    }

    #[test]
    fn test_camel_case_aliases() {
        let config =
            AdapterConfig::from_json(r#"{"authKey": "secret", "bufferSize": 25, "db": "app"}"#)
                .unwrap();
        assert_eq!(config.auth_key, "secret");
        assert_eq!(config.buffer_size, 25);
        assert_eq!(config.db, "app");
    }

    #[test]
    fn test_min_above_max_rejected() {
        let err = AdapterConfig::from_json(r#"{"min": 60, "max": 50}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_db_rejected() {
        let err = AdapterConfig::from_json(r#"{"db": ""}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"host": "db.internal", "port": 28016}}"#).unwrap();

        let config = AdapterConfig::load(file.path()).unwrap();
        assert_eq!(config.connection().socket_addr(), "db.internal:28016");
        assert_eq!(config.connection().pool_max, 50);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AdapterConfig::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
