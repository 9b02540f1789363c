//! Request latency accumulator

use std::time::Duration;

/// Min / max / mean of observed request latencies
#[derive(Debug, Clone, Copy, Default)]
pub struct LatencyStats {
    count: u64,
    total: Duration,
    min: Option<Duration>,
    max: Duration,
}

impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, latency: Duration) {
        self.count += 1;
        self.total += latency;
        self.min = Some(self.min.map_or(latency, |m| m.min(latency)));
        self.max = self.max.max(latency);
    }

    /// Fold another accumulator into this one
    pub fn merge(&mut self, other: &LatencyStats) {
        self.count += other.count;
        self.total += other.total;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min(&self) -> Option<Duration> {
        self.min
    }

    pub fn max(&self) -> Option<Duration> {
        (self.count > 0).then_some(self.max)
    }

    pub fn avg(&self) -> Option<Duration> {
        if self.count == 0 {
            None
        } else {
            Some(self.total / self.count as u32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let stats = LatencyStats::new();
        assert_eq!(stats.count(), 0);
        assert_eq!(stats.min(), None);
        assert_eq!(stats.max(), None);
        assert_eq!(stats.avg(), None);
    }

    #[test]
    fn test_record_and_merge() {
        let mut a = LatencyStats::new();
        a.record(Duration::from_millis(2));
        a.record(Duration::from_millis(4));

        let mut b = LatencyStats::new();
        b.record(Duration::from_millis(9));

        a.merge(&b);
        assert_eq!(a.count(), 3);
        assert_eq!(a.min(), Some(Duration::from_millis(2)));
        assert_eq!(a.max(), Some(Duration::from_millis(9)));
        assert_eq!(a.avg(), Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_merge_into_empty() {
        let mut a = LatencyStats::new();
        let mut b = LatencyStats::new();
        b.record(Duration::from_millis(3));
        a.merge(&b);
        assert_eq!(a.min(), Some(Duration::from_millis(3)));
    }
}
