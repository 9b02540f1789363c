//! Configuration validation
//!
//! Hard errors reject the config outright:
//! - Zero buffer capacity, batch size or scheduler intervals
//! - Zero HTTP port or payload limit
//! - Missing database path for the SQLite store
//!
//! Warnings are returned to the caller for logging:
//! - Poll interval too coarse for the time trigger
//! - Batch size larger than the buffer can ever hold

use crate::Config;
use crate::error::Result;

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    config.buffer.validate()?;
    config.scheduler.validate()?;
    config.http.validate()?;
    config.storage.validate()?;
    Ok(())
}

/// Collect non-fatal configuration warnings
pub fn collect_warnings(config: &Config) -> Vec<String> {
    let mut warnings = config.scheduler.warnings();

    if config.scheduler.max_batch_size > config.buffer.capacity {
        warnings.push(format!(
            "scheduler.max_batch_size ({}) exceeds buffer.capacity ({}); the size trigger can never fire",
            config.scheduler.max_batch_size, config.buffer.capacity
        ));
    }

    if config.metrics.enabled && config.metrics.interval.is_zero() {
        warnings.push("metrics.interval is 0; stats reporting disabled".to_string());
    }

    warnings
}
