//! SQLite store - durable event storage on an embedded database
//!
//! Uses Turso (embedded, SQLite-compatible). Turso statements run to
//! completion inside a single poll, so inserts yield to the runtime every
//! `ROWS_PER_YIELD` rows; otherwise a caller's deadline could never fire.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE events (
//!     id INTEGER PRIMARY KEY,
//!     user_id INTEGER NOT NULL,
//!     timestamp TEXT NOT NULL,
//!     metadata TEXT NOT NULL,
//!     created_at TEXT NOT NULL
//! );
//! ```
//!
//! Each `write_batch` call is one transaction: either every row lands or the
//! transaction is rolled back and the call fails. A write future dropped
//! before commit (for example by a timeout) rolls back as well.

use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use firehose_protocol::Event;
use futures_util::FutureExt;
use parking_lot::RwLock;
use tracing::{debug, info, warn};
use turso::{Builder, Connection, Database};

use crate::common::{MetricsSnapshot, Result, SinkError, SinkMetrics};
use crate::store::EventStore;

/// Path that selects a transient in-memory database
pub const MEMORY_PATH: &str = ":memory:";

const SCHEMA_EVENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        timestamp TEXT NOT NULL,
        metadata TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

const INDEX_EVENTS_USER: &str =
    "CREATE INDEX IF NOT EXISTS idx_events_user_id ON events(user_id)";

const INDEX_EVENTS_TIMESTAMP: &str =
    "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)";

const INSERT_EVENT: &str =
    "INSERT INTO events (user_id, timestamp, metadata, created_at) VALUES (?1, ?2, ?3, ?4)";

/// Inserts between cooperative yields
const ROWS_PER_YIELD: usize = 64;

/// A persisted event row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEvent {
    pub id: i64,
    pub user_id: i64,
    pub timestamp: String,
    /// Metadata as stored (JSON text)
    pub metadata: String,
    pub created_at: String,
}

/// Event store backed by a SQLite database file
pub struct SqliteStore {
    name: String,
    path: String,
    /// Set between `open` and `close`; `Database` is internally reference counted
    db: RwLock<Option<Database>>,
    metrics: SinkMetrics,
}

impl SqliteStore {
    /// Create a store for the database file at `path` (not opened yet)
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            name: "sqlite".into(),
            path: path.into(),
            db: RwLock::new(None),
            metrics: SinkMetrics::new(),
        }
    }

    /// Create a store on a transient in-memory database
    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }

    /// Database path as configured
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Read back up to `limit` rows in insertion order
    pub async fn read_events(&self, limit: usize) -> Result<Vec<StoredEvent>> {
        let conn = self.connect()?;

        // LIMIT is a plain integer, not user input
        let sql = format!(
            "SELECT id, user_id, timestamp, metadata, created_at \
             FROM events ORDER BY id LIMIT {limit}"
        );
        let mut rows = conn.query(&sql, ()).await?;

        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            events.push(row_to_event(&row)?);
        }
        Ok(events)
    }

    fn connect(&self) -> Result<Connection> {
        let db = self
            .db
            .read()
            .clone()
            .ok_or_else(|| SinkError::not_open(&self.name))?;
        Ok(db.connect()?)
    }

    async fn init_schema(db: &Database) -> Result<()> {
        let conn = db.connect()?;
        conn.execute(SCHEMA_EVENTS, ()).await?;
        conn.execute(INDEX_EVENTS_USER, ()).await?;
        conn.execute(INDEX_EVENTS_TIMESTAMP, ()).await?;
        Ok(())
    }
}

/// Rows ready for binding: (user_id, timestamp, metadata json)
type PreparedRow<'a> = (i64, &'a str, String);

fn prepare_row(event: &Event) -> Result<PreparedRow<'_>> {
    let producer = event.producer_id();
    let user_id = i64::try_from(producer.get())
        .map_err(|_| SinkError::write(format!("user_id {producer} does not fit an INTEGER column")))?;
    Ok((user_id, event.timestamp(), event.metadata_json()?))
}

async fn insert_rows(conn: &Connection, rows: &[PreparedRow<'_>], created_at: &str) -> Result<()> {
    for (i, (user_id, timestamp, metadata)) in rows.iter().enumerate() {
        conn.execute(
            INSERT_EVENT,
            (*user_id, *timestamp, metadata.as_str(), created_at),
        )
        .await?;

        if (i + 1) % ROWS_PER_YIELD == 0 {
            tokio::task::yield_now().await;
        }
    }
    Ok(())
}

/// An open batch transaction, rolled back on drop unless committed
struct WriteTransaction {
    conn: Connection,
    finished: bool,
}

impl WriteTransaction {
    async fn begin(conn: Connection) -> Result<Self> {
        conn.execute("BEGIN", ()).await?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    async fn commit(mut self) -> Result<()> {
        self.conn.execute("COMMIT", ()).await?;
        self.finished = true;
        Ok(())
    }

    async fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.conn.execute("ROLLBACK", ()).await?;
        Ok(())
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        // Turso statements complete on their first poll
        match self.conn.execute("ROLLBACK", ()).now_or_never() {
            Some(Ok(_)) => debug!("abandoned batch transaction rolled back"),
            Some(Err(e)) => warn!(error = %e, "rollback of abandoned batch transaction failed"),
            None => warn!("rollback of abandoned batch transaction did not complete"),
        }
    }
}

fn row_to_event(row: &turso::Row) -> Result<StoredEvent> {
    let empty = String::new();

    let id = *row.get_value(0)?.as_integer().unwrap_or(&0);
    let user_id = *row.get_value(1)?.as_integer().unwrap_or(&0);
    let timestamp = row.get_value(2)?.as_text().unwrap_or(&empty).clone();
    let metadata = row.get_value(3)?.as_text().unwrap_or(&empty).clone();
    let created_at = row.get_value(4)?.as_text().unwrap_or(&empty).clone();

    Ok(StoredEvent {
        id,
        user_id,
        timestamp,
        metadata,
        created_at,
    })
}

#[async_trait]
impl EventStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(SinkError::init("database path is empty"));
        }

        if self.path != MEMORY_PATH
            && let Some(parent) = Path::new(&self.path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        info!(path = %self.path, "opening event database");
        let db = Builder::new_local(&self.path).build().await?;
        Self::init_schema(&db).await?;

        *self.db.write() = Some(db);
        Ok(())
    }

    async fn write_batch(&self, events: &[Event]) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        let rows = events.iter().map(prepare_row).collect::<Result<Vec<_>>>()?;
        let created_at = Utc::now().to_rfc3339();

        let tx = WriteTransaction::begin(self.connect()?).await?;

        if let Err(e) = insert_rows(&tx.conn, &rows, &created_at).await {
            self.metrics.write_error(events.len() as u64);
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed after insert error");
            }
            return Err(e);
        }

        if let Err(e) = tx.commit().await {
            self.metrics.write_error(events.len() as u64);
            return Err(e);
        }

        self.metrics.batch_written(events.len() as u64);
        debug!(events = events.len(), "batch committed");
        Ok(events.len())
    }

    async fn event_count(&self) -> Result<Option<u64>> {
        let conn = self.connect()?;
        let mut rows = conn.query("SELECT COUNT(*) FROM events", ()).await?;

        let count = match rows.next().await? {
            Some(row) => *row.get_value(0)?.as_integer().unwrap_or(&0),
            None => 0,
        };
        Ok(Some(count.max(0) as u64))
    }

    async fn close(&self) -> Result<()> {
        if self.db.write().take().is_some() {
            let snapshot = self.metrics.snapshot();
            info!(
                path = %self.path,
                batches = snapshot.batches_written,
                events = snapshot.events_written,
                errors = snapshot.write_errors,
                "event database closed"
            );
        }
        Ok(())
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
