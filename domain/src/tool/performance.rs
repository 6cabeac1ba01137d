//! Rolling performance record for a tool
//!
//! Success rate and mean latency are exponential moving averages so recent
//! behavior dominates. The success rate starts at 1.0: a tool that has never
//! been called is not ranked below one that has failed.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smoothing factor for both moving averages
pub const EMA_ALPHA: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Number of recorded outcomes
    pub usage_count: u64,
    /// Exponential moving average of outcomes (1.0 = always succeeds)
    pub success_rate: f64,
    /// Exponential moving average of latency in milliseconds
    pub mean_latency_ms: f64,
}

impl Default for PerformanceRecord {
    fn default() -> Self {
        Self {
            usage_count: 0,
            success_rate: 1.0,
            mean_latency_ms: 0.0,
        }
    }
}

impl PerformanceRecord {
    /// Fold one call outcome into the record
    pub fn record(&mut self, success: bool, latency: Duration) {
        let outcome = if success { 1.0 } else { 0.0 };
        self.success_rate =
            (EMA_ALPHA * outcome + (1.0 - EMA_ALPHA) * self.success_rate).clamp(0.0, 1.0);

        let latency_ms = latency.as_secs_f64() * 1000.0;
        self.mean_latency_ms = if self.usage_count == 0 {
            latency_ms
        } else {
            EMA_ALPHA * latency_ms + (1.0 - EMA_ALPHA) * self.mean_latency_ms
        };

        self.usage_count = self.usage_count.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_optimistic() {
        let record = PerformanceRecord::default();
        assert_eq!(record.usage_count, 0);
        assert_eq!(record.success_rate, 1.0);
    }

    #[test]
    fn test_failures_move_toward_zero() {
        let mut record = PerformanceRecord::default();
        let mut previous = record.success_rate;
        for _ in 0..50 {
            record.record(false, Duration::from_millis(5));
            assert!(record.success_rate < previous);
            assert!((0.0..=1.0).contains(&record.success_rate));
            previous = record.success_rate;
        }
        assert!(record.success_rate < 0.01);
    }

    #[test]
    fn test_successes_move_toward_one() {
        let mut record = PerformanceRecord::default();
        for _ in 0..10 {
            record.record(false, Duration::from_millis(5));
        }
        let mut previous = record.success_rate;
        for _ in 0..50 {
            record.record(true, Duration::from_millis(5));
            assert!(record.success_rate > previous);
            assert!((0.0..=1.0).contains(&record.success_rate));
            previous = record.success_rate;
        }
        assert!(record.success_rate > 0.99);
    }

    #[test]
    fn test_latency_seeded_by_first_observation() {
        let mut record = PerformanceRecord::default();
        record.record(true, Duration::from_millis(100));
        assert_eq!(record.mean_latency_ms, 100.0);

        record.record(true, Duration::from_millis(200));
        assert!((record.mean_latency_ms - 120.0).abs() < 1e-9);
        assert_eq!(record.usage_count, 2);
    }
}
