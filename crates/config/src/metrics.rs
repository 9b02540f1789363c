//! Periodic stats reporting configuration
//!
//! # Defaults
//!
//! - `enabled`: true
//! - `interval`: 10s
//! - `format`: human

use serde::Deserialize;
use std::time::Duration;

/// Stats output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MetricsFormat {
    /// Human-readable log line (default)
    #[default]
    Human,
    /// Structured fields suitable for JSON log shipping
    Json,
}

/// Stats reporter configuration
///
/// # Example
///
/// ```toml
/// [metrics]
/// enabled = true
/// interval = "30s"
/// format = "json"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Log buffer and flush stats periodically
    /// Default: true
    pub enabled: bool,

    /// Reporting interval
    /// Default: 10s
    #[serde(with = "humantime_serde")]
    pub interval: Duration,

    /// Default: human
    pub format: MetricsFormat,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(10),
            format: MetricsFormat::Human,
        }
    }
}
