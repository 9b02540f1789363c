//! Storage backend configuration

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Which store backs the pipeline
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Embedded SQLite database file (default)
    #[default]
    Sqlite,
    /// Keep events in process memory (testing)
    Memory,
    /// Discard events (benchmarking)
    Null,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
            Self::Null => "null",
        }
    }
}

/// Storage configuration
///
/// # Example
///
/// ```toml
/// [storage]
/// type = "sqlite"
/// path = "data/events.db"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend type
    /// Default: sqlite
    #[serde(rename = "type")]
    pub storage_type: StorageType,

    /// Database file, or ":memory:" for a transient database
    /// Default: "events.db"
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: StorageType::Sqlite,
            path: "events.db".into(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.storage_type == StorageType::Sqlite && self.path.trim().is_empty() {
            return Err(ConfigError::missing_field("storage", "path"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config: StorageConfig = toml::from_str("").unwrap();
        assert_eq!(config.storage_type, StorageType::Sqlite);
        assert_eq!(config.path, "events.db");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_types() {
        for (s, expected) in [
            ("sqlite", StorageType::Sqlite),
            ("memory", StorageType::Memory),
            ("null", StorageType::Null),
        ] {
            let toml = format!("type = \"{}\"", s);
            let config: StorageConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config.storage_type, expected);
            assert_eq!(expected.as_str(), s);
        }
    }

    #[test]
    fn test_unknown_type_is_parse_error() {
        let result: std::result::Result<StorageConfig, _> = toml::from_str("type = \"postgres\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_sqlite_path() {
        let config: StorageConfig = toml::from_str("path = \"\"").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("path"));

        // Path is irrelevant for non-file stores
        let config: StorageConfig = toml::from_str("type = \"null\"\npath = \"\"").unwrap();
        assert!(config.validate().is_ok());
    }
}
