//! Periodic stats reporter
//!
//! Logs buffer and flush counters at the configured interval, together with
//! per-interval deltas. Runs as its own task until cancelled.

use std::sync::Arc;
use std::time::{Duration, Instant};

use firehose_config::{MetricsConfig, MetricsFormat};
use firehose_sinks::EventStore;
use serde::Serialize;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::buffer::{BufferStats, EventBuffer};
use crate::metrics::{FlushMetrics, FlushMetricsSnapshot};

/// One reporting sample
#[derive(Debug, Clone, Serialize)]
pub struct StatsSample {
    pub buffer: BufferStats,
    pub flush: FlushMetricsSnapshot,
    /// Rows in the store, when it can count them
    pub database_events: Option<u64>,
    /// Counter changes since the previous sample
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<IntervalStats>,
}

/// Counter deltas over one reporting interval
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IntervalStats {
    pub elapsed_ms: u64,
    pub received: u64,
    pub processed: u64,
    pub dropped: u64,
    pub failed: u64,
    pub batches: u64,
    /// Processed events per second
    pub events_per_sec: f64,
}

impl IntervalStats {
    fn between(
        buffer: &BufferStats,
        flush: &FlushMetricsSnapshot,
        prev: &(BufferStats, FlushMetricsSnapshot),
        elapsed: Duration,
    ) -> Self {
        let b = buffer.diff(&prev.0);
        let f = flush.diff(&prev.1);
        let secs = elapsed.as_secs_f64();

        Self {
            elapsed_ms: elapsed.as_millis() as u64,
            received: b.total_received,
            processed: b.total_processed,
            dropped: b.total_dropped,
            failed: b.total_failed,
            batches: f.batches_flushed,
            events_per_sec: if secs > 0.0 {
                b.total_processed as f64 / secs
            } else {
                0.0
            },
        }
    }
}

/// Reports pipeline stats on an interval
pub struct StatsReporter {
    config: MetricsConfig,
    buffer: Arc<EventBuffer>,
    flush: Arc<FlushMetrics>,
    store: Arc<dyn EventStore>,
    previous: Option<(BufferStats, FlushMetricsSnapshot)>,
    last_sample: Instant,
}

impl StatsReporter {
    pub fn new(
        config: MetricsConfig,
        buffer: Arc<EventBuffer>,
        flush: Arc<FlushMetrics>,
        store: Arc<dyn EventStore>,
    ) -> Self {
        Self {
            config,
            buffer,
            flush,
            store,
            previous: None,
            last_sample: Instant::now(),
        }
    }

    /// Run the reporter until cancellation
    pub async fn run(mut self, cancel: CancellationToken) {
        if !self.config.enabled || self.config.interval.is_zero() {
            info!("stats reporting disabled");
            return;
        }

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately; skip it so the first report has a full interval
        ticker.tick().await;

        info!(
            interval_secs = self.config.interval.as_secs(),
            format = ?self.config.format,
            "stats reporter started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("stats reporter shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let sample = self.sample().await;
                    self.report(&sample);
                }
            }
        }
    }

    /// Take a sample and advance the interval baseline
    pub async fn sample(&mut self) -> StatsSample {
        let buffer = self.buffer.stats();
        let flush = self.flush.snapshot();

        let database_events = match self.store.event_count().await {
            Ok(count) => count,
            Err(e) => {
                warn!(store = %self.store.name(), error = %e, "failed to count stored events");
                None
            }
        };

        let now = Instant::now();
        let interval = self
            .previous
            .as_ref()
            .map(|prev| IntervalStats::between(&buffer, &flush, prev, now - self.last_sample));

        self.previous = Some((buffer, flush));
        self.last_sample = now;

        StatsSample {
            buffer,
            flush,
            database_events,
            interval,
        }
    }

    fn report(&self, sample: &StatsSample) {
        match self.config.format {
            MetricsFormat::Human => info!("{}", format_human(sample)),
            MetricsFormat::Json => match serde_json::to_string(sample) {
                Ok(json) => info!(stats = %json, "pipeline stats"),
                Err(e) => warn!(error = %e, "failed to serialize stats"),
            },
        }
    }
}

/// Single-line human summary of a sample
pub fn format_human(sample: &StatsSample) -> String {
    let b = &sample.buffer;
    let mut line = format!(
        "queue={}/{} ({:.1}%) received={} processed={} dropped={} failed={} in_flight={}",
        b.queue_size,
        b.capacity,
        b.utilization() * 100.0,
        b.total_received,
        b.total_processed,
        b.total_dropped,
        b.total_failed,
        b.in_flight,
    );

    if let Some(avg) = sample.flush.avg_flush_duration() {
        line.push_str(&format!(
            " batches={} avg_flush={:.2}ms",
            sample.flush.batches_flushed,
            avg.as_secs_f64() * 1000.0
        ));
    }

    if let Some(count) = sample.database_events {
        line.push_str(&format!(" stored={count}"));
    }

    if let Some(delta) = &sample.interval {
        line.push_str(&format!(
            " | +{} received +{} processed +{} dropped ({:.0} ev/s)",
            delta.received, delta.processed, delta.dropped, delta.events_per_sec
        ));
    }

    line
}
