//! Firehose Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file is a valid config - only specify what you need to change.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use firehose_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[buffer]\ncapacity = 5000").unwrap();
//! assert_eq!(config.buffer.capacity, 5000);
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [log]
//! level = "info"
//! format = "console"
//!
//! [buffer]
//! capacity = 100000
//!
//! [scheduler]
//! max_batch_size = 100
//! max_wait_interval = "1s"
//! poll_interval = "100ms"
//! error_backoff = "1s"
//!
//! [http]
//! port = 8000
//!
//! [storage]
//! type = "sqlite"
//! path = "events.db"
//!
//! [metrics]
//! interval = "10s"
//! ```

mod error;
mod http;
mod logging;
mod metrics;
mod pipeline;
mod storage;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use http::HttpConfig;
pub use logging::{LogConfig, LogFormat, LogLevel, LogOutput};
pub use metrics::{MetricsConfig, MetricsFormat};
pub use pipeline::{BufferConfig, DEFAULT_BUFFER_CAPACITY, SchedulerConfig};
pub use storage::{StorageConfig, StorageType};

use serde::Deserialize;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Periodic stats reporting
    pub metrics: MetricsConfig,

    /// In-memory staging buffer
    pub buffer: BufferConfig,

    /// Flush triggers and timeouts
    pub scheduler: SchedulerConfig,

    /// HTTP ingestion endpoint
    pub http: HttpConfig,

    /// Durable event store
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }

    /// Non-fatal problems worth logging at startup
    pub fn warnings(&self) -> Vec<String> {
        validation::collect_warnings(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.buffer.capacity, DEFAULT_BUFFER_CAPACITY);
        assert_eq!(config.scheduler.max_batch_size, 100);
        assert_eq!(config.http.port, 8000);
        assert_eq!(config.storage.storage_type, StorageType::Sqlite);
        assert_eq!(config.log.level, LogLevel::Info);
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"
output = "stderr"

[buffer]
capacity = 5000

[scheduler]
max_batch_size = 250
max_wait_interval = "5s"
poll_interval = "25ms"
error_backoff = "2s"
write_timeout = "10s"
drain_timeout = "20s"

[http]
address = "127.0.0.1"
port = 9100
max_payload_size = 4096
request_logging = true

[storage]
type = "memory"

[metrics]
enabled = true
interval = "30s"
format = "json"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.output, LogOutput::Stderr);
        assert_eq!(config.buffer.capacity, 5000);
        assert_eq!(config.scheduler.max_batch_size, 250);
        assert_eq!(config.scheduler.max_wait_interval, Duration::from_secs(5));
        assert_eq!(config.scheduler.poll_interval, Duration::from_millis(25));
        assert_eq!(config.scheduler.error_backoff, Duration::from_secs(2));
        assert_eq!(config.scheduler.write_timeout, Duration::from_secs(10));
        assert_eq!(config.scheduler.drain_timeout, Duration::from_secs(20));
        assert_eq!(config.http.addr(), "127.0.0.1:9100");
        assert_eq!(config.http.max_payload_size, 4096);
        assert!(config.http.request_logging);
        assert_eq!(config.storage.storage_type, StorageType::Memory);
        assert_eq!(config.metrics.interval, Duration::from_secs(30));
        assert_eq!(config.metrics.format, MetricsFormat::Json);
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[buffer]\ncapacity = 42").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.buffer.capacity, 42);
    }

    #[test]
    fn test_from_missing_file() {
        let result = Config::from_file("/nonexistent/firehose.toml");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::IoError { .. }));
        assert!(err.to_string().contains("/nonexistent/firehose.toml"));
    }
}
