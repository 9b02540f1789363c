//! The batch-write contract between the pipeline and durable storage

use async_trait::async_trait;
use firehose_protocol::Event;

use crate::common::{MetricsSnapshot, Result};

/// A durable destination for batches of events
///
/// `write_batch` is all-or-nothing: on `Ok` every event in the slice is
/// persisted, on `Err` none are. The scheduler is the only writer; other
/// callers may use `event_count` concurrently.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Prepare the store for writes (create files, schema, connections)
    async fn open(&self) -> Result<()>;

    /// Persist a batch, returning the number of events written
    async fn write_batch(&self, events: &[Event]) -> Result<usize>;

    /// Number of events currently persisted, if the store can tell
    async fn event_count(&self) -> Result<Option<u64>> {
        Ok(None)
    }

    /// Release resources; later writes fail
    async fn close(&self) -> Result<()>;

    /// Write metrics for this store
    fn metrics(&self) -> MetricsSnapshot;
}
