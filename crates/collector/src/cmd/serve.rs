//! Serve command - Run the collector
//!
//! Startup order: store, pipeline, HTTP. Shutdown runs the other way round:
//! HTTP stops accepting, then the pipeline drains into the store.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use firehose_config::Config;
use firehose_pipeline::{EventBuffer, LifecycleController, ShutdownReport, StatsReporter};
use firehose_sinks::build_store;
use firehose_sources::{HttpMetricsSnapshot, HttpSource, HttpSourceConfig};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How long to wait for the HTTP server and reporter to stop
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Config file locations tried when `--config` is not given
const DEFAULT_CONFIG_PATHS: [&str; 2] = ["configs/config.toml", "config.toml"];

/// Serve command arguments
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Path to configuration file (defaults to configs/config.toml if not specified)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Configuration plus where it came from
pub struct LoadedConfig {
    pub config: Config,
    pub source: String,
}

/// Load configuration
///
/// An explicit path must exist. Otherwise the default locations are tried in
/// order and built-in defaults are used if none exists.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        let config = Config::from_file(path).context("failed to load configuration")?;
        return Ok(LoadedConfig {
            config,
            source: path.display().to_string(),
        });
    }

    for candidate in DEFAULT_CONFIG_PATHS {
        let path = Path::new(candidate);
        if path.exists() {
            let config = Config::from_file(path).context("failed to load configuration")?;
            return Ok(LoadedConfig {
                config,
                source: candidate.to_string(),
            });
        }
    }

    Ok(LoadedConfig {
        config: Config::default(),
        source: "(defaults)".to_string(),
    })
}

/// Run the serve command
pub async fn run(loaded: LoadedConfig) -> Result<()> {
    let LoadedConfig { config, source } = loaded;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        config = %source,
        "Firehose starting"
    );

    for warning in config.warnings() {
        warn!(warning = %warning, "configuration warning");
    }

    if let Err(e) = run_server(config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("Firehose shutdown complete");
    Ok(())
}

/// Main server run loop
async fn run_server(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();

    // Bind before starting the pipeline so a busy port fails fast
    let bind_addr = config.http.addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {bind_addr}"))?;

    let store = build_store(&config.storage);
    info!(
        store = %store.name(),
        path = %config.storage.path,
        capacity = config.buffer.capacity,
        max_batch_size = config.scheduler.max_batch_size,
        max_wait = ?config.scheduler.max_wait_interval,
        "configuring pipeline"
    );

    let buffer = Arc::new(EventBuffer::new(config.buffer.capacity));
    let lifecycle = LifecycleController::start(
        Arc::clone(&buffer),
        Arc::clone(&store),
        config.scheduler.clone(),
    )
    .await
    .context("failed to start pipeline")?;

    let reporter = StatsReporter::new(
        config.metrics.clone(),
        Arc::clone(&buffer),
        lifecycle.flush_metrics(),
        Arc::clone(&store),
    );
    let reporter_task = tokio::spawn(reporter.run(cancel.clone()));

    let source = HttpSource::new(
        HttpSourceConfig::from(&config.http),
        Arc::clone(&buffer),
        Arc::clone(&store),
    );
    let http_metrics = source.metrics_handle();
    let mut http_task = tokio::spawn(source.run_with_listener(listener, cancel.clone()));

    // Wait for a signal, or for the HTTP server to die on its own
    let mut http_result = None;
    tokio::select! {
        _ = wait_for_shutdown() => {
            info!("shutdown signal received");
        }
        result = &mut http_task => {
            warn!("HTTP source exited unexpectedly");
            http_result = Some(result);
        }
    }

    info!("initiating graceful shutdown");
    cancel.cancel();

    let http_result = match http_result {
        Some(result) => Some(result),
        None => join_with_timeout("HTTP source", http_task).await,
    };
    join_with_timeout("stats reporter", reporter_task).await;

    let report = lifecycle.shutdown().await;
    log_shutdown(&report, &http_metrics.snapshot());

    if let Some(Ok(Err(e))) = http_result {
        return Err(anyhow::Error::new(e).context("HTTP source failed"));
    }
    if let Some(e) = report.drain_error() {
        return Err(anyhow::Error::new(e));
    }
    Ok(())
}

/// Await a task for at most `TASK_SHUTDOWN_TIMEOUT`
///
/// Returns None if the task did not finish in time.
async fn join_with_timeout<T>(
    name: &str,
    task: JoinHandle<T>,
) -> Option<std::result::Result<T, tokio::task::JoinError>> {
    match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, task).await {
        Ok(Err(e)) => {
            warn!(task = name, error = %e, "task panicked");
            Some(Err(e))
        }
        Ok(result) => Some(result),
        Err(_) => {
            warn!(task = name, "task did not finish within timeout, continuing shutdown");
            None
        }
    }
}

fn log_shutdown(report: &ShutdownReport, http: &HttpMetricsSnapshot) {
    let stats = &report.final_stats;
    info!(
        requests = http.requests_total,
        accepted = http.events_accepted,
        rejected = http.unavailable(),
        invalid = http.client_errors(),
        "HTTP summary"
    );
    info!(
        total_received = stats.total_received,
        total_processed = stats.total_processed,
        total_dropped = stats.total_dropped,
        total_failed = stats.total_failed,
        batches = report.flush.batches_flushed,
        drained = report.drained(),
        uptime_secs = report.uptime.as_secs(),
        "pipeline summary"
    );

    if let Some(e) = &report.store_close_error {
        warn!(error = %e, "store did not close cleanly");
    }
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_explicit_config_must_exist() {
        let result = load_config(Some(Path::new("/nonexistent/firehose.toml")));
        let err = result.err().unwrap();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn test_explicit_config_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nport = 9123").unwrap();

        let loaded = load_config(Some(file.path())).unwrap();
        assert_eq!(loaded.config.http.port, 9123);
        assert_eq!(loaded.source, file.path().display().to_string());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[scheduler]\nmax_batch_size = 0").unwrap();

        assert!(load_config(Some(file.path())).is_err());
    }
}
