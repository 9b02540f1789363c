//! Clickstream event generator
//!
//! # Terminology
//!
//! - Producer: simulated user, one `user_id` per client
//! - Event: one page interaction with nested metadata (~400 bytes of JSON)

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use serde_json::{Value, json};

pub const PAGES: &[&str] = &["/home", "/products", "/cart", "/checkout", "/profile", "/search"];
pub const ACTIONS: &[&str] = &["click", "view", "scroll", "hover", "submit"];
pub const BUTTONS: &[&str] = &["signup", "login", "buy", "add-to-cart", "search", "filter"];
pub const DEVICES: &[&str] = &["desktop", "mobile", "tablet"];
pub const BROWSERS: &[&str] = &["chrome", "firefox", "safari", "edge"];

fn pick<R: Rng + ?Sized>(rng: &mut R, values: &[&'static str]) -> &'static str {
    values.choose(rng).copied().unwrap_or_default()
}

/// Build one random clickstream event for `user_id`
pub fn random_event<R: Rng + ?Sized>(rng: &mut R, user_id: u64) -> Value {
    json!({
        "user_id": user_id,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        "metadata": {
            "page": pick(rng, PAGES),
            "action": pick(rng, ACTIONS),
            "button": pick(rng, BUTTONS),
            "device": pick(rng, DEVICES),
            "browser": pick(rng, BROWSERS),
            "session_id": format!("sess_{}", rng.random_range(1000..=9999)),
            "nested": {
                "referrer": "https://google.com",
                "campaign": format!("campaign_{}", rng.random_range(1..=10)),
                "extra": {
                    "deep": "nested",
                    "value": rng.random_range(1..=100),
                }
            }
        }
    })
}
