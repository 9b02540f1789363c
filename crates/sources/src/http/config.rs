//! HTTP source configuration
//!
//! Runtime options for the ingestion endpoint, built from the `[http]`
//! section of the service configuration.

use firehose_config::HttpConfig;

/// Default HTTP port
const DEFAULT_PORT: u16 = 8000;

/// Default maximum payload size (1MB)
const DEFAULT_MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// HTTP source configuration
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub address: String,

    /// Listen port
    pub port: u16,

    /// Maximum request payload size in bytes
    pub max_payload_size: usize,

    /// Trace every request through tower-http
    pub request_logging: bool,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            max_payload_size: DEFAULT_MAX_PAYLOAD_SIZE,
            request_logging: false,
        }
    }
}

impl HttpSourceConfig {
    /// Create config with a specific port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the bind address string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl From<&HttpConfig> for HttpSourceConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            address: config.address.clone(),
            port: config.port,
            max_payload_size: config.max_payload_size,
            request_logging: config.request_logging,
        }
    }
}
