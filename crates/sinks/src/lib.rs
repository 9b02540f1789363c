//! Firehose - Stores
//!
//! Durable destinations for batches of events.
//!
//! # Architecture
//!
//! The batch scheduler owns the only write path. It pulls a batch from the
//! staging buffer and hands it to an `EventStore` as a slice:
//!
//! ```text
//! [EventBuffer] --Vec<Event>--> [BatchScheduler] --&[Event]--> [EventStore]
//! ```
//!
//! # Available Stores
//!
//! | Store | Purpose |
//! |-------|---------|
//! | `sqlite` | Durable storage in an embedded database (default) |
//! | `memory` | In-process storage with fault injection (testing) |
//! | `null` | Benchmarking (discard all) |
//!
//! # Example
//!
//! ```ignore
//! use firehose_sinks::{EventStore, SqliteStore};
//!
//! let store = SqliteStore::new("events.db");
//! store.open().await?;
//! store.write_batch(&events).await?;
//! store.close().await?;
//! ```

use std::sync::Arc;

use firehose_config::{StorageConfig, StorageType};

// =============================================================================
// Store implementations (each in its own submodule)
// =============================================================================

/// Null store - discards all data (for benchmarking)
pub mod null;

/// Memory store - in-process storage with fault injection
pub mod memory;

/// SQLite store - durable storage via Turso
pub mod sqlite;

/// Common types shared by all stores (errors, metrics)
mod common;

/// The `EventStore` trait
mod store;

// =============================================================================
// Public re-exports
// =============================================================================

pub use common::{MetricsSnapshot, Result, SinkError, SinkMetrics};
pub use memory::MemoryStore;
pub use null::NullStore;
pub use sqlite::{SqliteStore, StoredEvent};
pub use store::EventStore;

/// Build the store selected by configuration (not opened yet)
pub fn build_store(config: &StorageConfig) -> Arc<dyn EventStore> {
    match config.storage_type {
        StorageType::Sqlite => Arc::new(SqliteStore::new(&config.path)),
        StorageType::Memory => Arc::new(MemoryStore::new()),
        StorageType::Null => Arc::new(NullStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_store_by_type() {
        for (storage_type, name) in [
            (StorageType::Sqlite, "sqlite"),
            (StorageType::Memory, "memory"),
            (StorageType::Null, "null"),
        ] {
            let config = StorageConfig {
                storage_type,
                path: "events.db".into(),
            };
            assert_eq!(build_store(&config).name(), name);
        }
    }
}
