//! Load test binary - concurrent clients posting clickstream events
//!
//! Run against a live collector to measure admission throughput and latency.
//!
//! Usage:
//!   cargo run --release -p firehose-bench --bin loadtest
//!   cargo run --release -p firehose-bench --bin loadtest -- --clients 50 --events 200000
//!   cargo run --release -p firehose-bench --bin loadtest -- --duration 30s
//!
//! Default: 20 clients, 10000 events total

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use firehose_bench::{LatencyStats, random_event};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Load test configuration
#[derive(Parser, Debug)]
#[command(name = "loadtest", about = "Firehose collector load test")]
struct Args {
    /// Collector base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8000")]
    url: String,

    /// Number of concurrent clients
    #[arg(short, long, default_value = "20")]
    clients: usize,

    /// Total events to send (ignored when --duration is set)
    #[arg(short, long, default_value = "10000")]
    events: u64,

    /// Run for this long instead of a fixed event count (e.g. "30s")
    #[arg(short, long, value_parser = humantime::parse_duration)]
    duration: Option<Duration>,

    /// Maximum random pause between requests per client, in milliseconds
    #[arg(short, long, default_value = "0")]
    think_ms: u64,

    /// Report interval in seconds
    #[arg(short, long, default_value = "1")]
    report_interval: u64,
}

/// Get current timestamp in ISO format
fn timestamp() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// Shared counters
#[derive(Default)]
struct Metrics {
    sent: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    errors: AtomicU64,
    clients_done: AtomicU64,
}

/// How long each client keeps sending
#[derive(Clone, Copy)]
enum Budget {
    Events(u64),
    Until(Instant),
}

impl Budget {
    fn exhausted(&self, sent: u64) -> bool {
        match *self {
            Budget::Events(n) => sent >= n,
            Budget::Until(deadline) => Instant::now() >= deadline,
        }
    }
}

/// Run a single client, returning its latency stats
async fn run_client(
    client_id: usize,
    http: reqwest::Client,
    endpoint: Arc<str>,
    budget: Budget,
    think_ms: u64,
    metrics: Arc<Metrics>,
    start_signal: Arc<Semaphore>,
) -> LatencyStats {
    let mut rng = StdRng::seed_from_u64(client_id as u64 ^ 0x5eed);
    let user_id = rng.random_range(1..=1_000_000u64);
    let mut latency = LatencyStats::new();
    let mut sent = 0u64;

    // Wait for start signal (all clients spawned)
    let _ = start_signal.acquire().await;

    while !budget.exhausted(sent) {
        let event = random_event(&mut rng, user_id);

        let started = Instant::now();
        let result = http.post(endpoint.as_ref()).json(&event).send().await;
        let elapsed = started.elapsed();

        sent += 1;
        metrics.sent.fetch_add(1, Ordering::Relaxed);

        match result {
            Ok(response) => {
                latency.record(elapsed);
                match response.status().as_u16() {
                    202 => metrics.accepted.fetch_add(1, Ordering::Relaxed),
                    503 => metrics.rejected.fetch_add(1, Ordering::Relaxed),
                    _ => metrics.errors.fetch_add(1, Ordering::Relaxed),
                };
            }
            Err(e) => {
                if metrics.errors.fetch_add(1, Ordering::Relaxed) == 0 {
                    eprintln!("Client {} request error: {}", client_id, e);
                }
            }
        }

        if think_ms > 0 {
            let pause = rng.random_range(0..=think_ms);
            tokio::time::sleep(Duration::from_millis(pause)).await;
        }
    }

    metrics.clients_done.fetch_add(1, Ordering::Relaxed);
    latency
}

/// Reporter task - prints progress every interval until all clients finish
async fn reporter(metrics: Arc<Metrics>, num_clients: usize, interval: Duration, start: Instant) {
    let mut last_sent = 0u64;
    let mut last_time = start;

    loop {
        tokio::time::sleep(interval).await;

        let now = Instant::now();
        let sent = metrics.sent.load(Ordering::Relaxed);
        let done = metrics.clients_done.load(Ordering::Relaxed);
        let rate = (sent - last_sent) as f64 / now.duration_since(last_time).as_secs_f64();

        println!(
            "[{:>6.1}s] {:>9.0} req/s | sent: {:>9} | accepted: {:>9} | rejected: {:>7} | errors: {:>5} | clients: {}/{}",
            now.duration_since(start).as_secs_f64(),
            rate,
            sent,
            metrics.accepted.load(Ordering::Relaxed),
            metrics.rejected.load(Ordering::Relaxed),
            metrics.errors.load(Ordering::Relaxed),
            num_clients as u64 - done,
            num_clients,
        );

        last_sent = sent;
        last_time = now;

        if done >= num_clients as u64 {
            break;
        }
    }
}

fn millis(d: Option<Duration>) -> f64 {
    d.map_or(0.0, |d| d.as_secs_f64() * 1000.0)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    anyhow::ensure!(args.clients > 0, "--clients must be greater than 0");

    let endpoint: Arc<str> = format!("{}/event", args.url.trim_end_matches('/')).into();
    let http = reqwest::Client::builder()
        .pool_max_idle_per_host(args.clients)
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build HTTP client")?;

    match args.duration {
        Some(d) => println!(
            "Load Test | {} | {} clients | {:?}",
            endpoint, args.clients, d
        ),
        None => println!(
            "Load Test | {} | {} clients | {} events",
            endpoint, args.clients, args.events
        ),
    }

    let metrics = Arc::new(Metrics::default());
    let start_signal = Arc::new(Semaphore::new(0));
    let mut clients = JoinSet::new();

    // Spread the event budget; the first clients take the remainder
    let per_client = args.events / args.clients as u64;
    let remainder = args.events % args.clients as u64;
    let deadline = args.duration.map(|d| Instant::now() + d);

    for i in 0..args.clients {
        let budget = match deadline {
            Some(deadline) => Budget::Until(deadline),
            None => Budget::Events(per_client + u64::from((i as u64) < remainder)),
        };

        clients.spawn(run_client(
            i,
            http.clone(),
            Arc::clone(&endpoint),
            budget,
            args.think_ms,
            Arc::clone(&metrics),
            Arc::clone(&start_signal),
        ));
    }

    println!("Started   | {}", timestamp());
    let start = Instant::now();
    start_signal.add_permits(args.clients);

    let reporter_handle = tokio::spawn(reporter(
        Arc::clone(&metrics),
        args.clients,
        Duration::from_secs(args.report_interval.max(1)),
        start,
    ));

    let mut latency = LatencyStats::new();
    while let Some(result) = clients.join_next().await {
        match result {
            Ok(stats) => latency.merge(&stats),
            Err(e) => eprintln!("Client task error: {}", e),
        }
    }
    let total_secs = start.elapsed().as_secs_f64();
    let _ = reporter_handle.await;

    let sent = metrics.sent.load(Ordering::Relaxed);
    let accepted = metrics.accepted.load(Ordering::Relaxed);
    let rejected = metrics.rejected.load(Ordering::Relaxed);
    let errors = metrics.errors.load(Ordering::Relaxed);

    println!();
    println!("Finished  | {}", timestamp());
    println!(
        "Results   | {} sent | {} accepted (202) | {} rejected (503) | {} errors | {:.2}s | {:.0} req/s",
        sent,
        accepted,
        rejected,
        errors,
        total_secs,
        sent as f64 / total_secs.max(f64::EPSILON),
    );
    println!(
        "Latency   | min {:.2}ms | avg {:.2}ms | max {:.2}ms",
        millis(latency.min()),
        millis(latency.avg()),
        millis(latency.max()),
    );
    if sent > 0 {
        println!(
            "Rejection | {:.2}%",
            (rejected + errors) as f64 / sent as f64 * 100.0
        );
    }

    Ok(())
}
