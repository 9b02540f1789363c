//! Shared load generation helpers for Firehose
//!
//! Realistic clickstream payloads and latency bookkeeping used by the
//! `loadtest` binary.

mod clickstream;
mod latency;

pub use clickstream::{ACTIONS, BROWSERS, BUTTONS, DEVICES, PAGES, random_event};
pub use latency::LatencyStats;
