//! Firehose - Event collector service
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! firehose
//! firehose --config configs/config.toml
//! firehose serve --log-level debug
//! ```

mod cmd;

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use firehose_config::{LogConfig, LogFormat, LogOutput};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Firehose - HTTP event collector with batched persistence
#[derive(Parser, Debug)]
#[command(name = "firehose")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (error if specified but not found)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log level or filter directive. Overrides config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the server
    Serve(cmd::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut args = match cli.command {
        Some(Command::Serve(args)) => args,
        // No subcommand = run server
        None => cmd::serve::ServeArgs::default(),
    };

    // CLI global --config overrides subcommand config if both specified
    if args.config.is_none() {
        args.config = cli.config;
    }

    // Logging settings live in the config file, so load it first
    let loaded = cmd::serve::load_config(args.config.as_deref())?;
    init_logging(&loaded.config.log, cli.log_level.as_deref())?;

    cmd::serve::run(loaded).await
}

/// Initialize the tracing subscriber for logging
fn init_logging(log: &LogConfig, cli_level: Option<&str>) -> Result<()> {
    let directive = log.filter_directive(cli_level);
    let filter = EnvFilter::try_new(&directive)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let (writer, ansi) = match &log.output {
        LogOutput::Stdout => (BoxMakeWriter::new(std::io::stdout), true),
        LogOutput::Stderr => (BoxMakeWriter::new(std::io::stderr), true),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path}"))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
    };

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_writer(writer))
            .init(),
    }

    Ok(())
}
