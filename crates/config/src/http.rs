//! HTTP ingestion endpoint configuration

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// HTTP gateway configuration
///
/// # Example
///
/// ```toml
/// [http]
/// address = "127.0.0.1"
/// port = 9000
/// max_payload_size = 65536
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    /// Default: "0.0.0.0"
    pub address: String,

    /// Listen port
    /// Default: 8000
    pub port: u16,

    /// Maximum request body in bytes
    /// Default: 1MB
    pub max_payload_size: usize,

    /// Log every request at DEBUG through a tower-http trace layer
    /// Default: false
    pub request_logging: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: 8000,
            max_payload_size: 1024 * 1024,
            request_logging: false,
        }
    }
}

impl HttpConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::missing_field("http", "address"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid_value(
                "http",
                "port",
                "must be between 1 and 65535",
            ));
        }
        if self.max_payload_size == 0 {
            return Err(ConfigError::invalid_value(
                "http",
                "max_payload_size",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8000");
        assert_eq!(config.max_payload_size, 1024 * 1024);
        assert!(!config.request_logging);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: HttpConfig = toml::from_str("port = 9000\nrequest_logging = true").unwrap();
        assert_eq!(config.addr(), "0.0.0.0:9000");
        assert!(config.request_logging);
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let config: HttpConfig = toml::from_str("port = 0").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn test_validate_rejects_zero_payload() {
        let config: HttpConfig = toml::from_str("max_payload_size = 0").unwrap();
        assert!(config.validate().is_err());
    }
}
