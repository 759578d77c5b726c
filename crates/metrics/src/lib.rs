//! In-process metrics
//!
//! `MetricsCollector` keeps its own counters and bounded rolling windows
//! for local `snapshot()` queries, and forwards every observation to the
//! `metrics` facade so whatever recorder the embedding process installs
//! (exporter, test recorder, nothing) sees the same stream. Every path
//! is non-panicking and holds locks only long enough to touch a map
//! entry.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

/// Samples kept per rolling window.
const WINDOW_CAPACITY: usize = 512;

/// Aggregate view of one rolling window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowStats {
    pub count: usize,
    pub mean: f64,
    pub p95: f64,
}

/// Point-in-time view of all collected metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub windows: HashMap<String, WindowStats>,
}

#[derive(Default)]
struct Inner {
    counters: Mutex<HashMap<String, u64>>,
    windows: Mutex<HashMap<String, VecDeque<f64>>>,
}

/// Cheaply cloneable collector shared across the engine.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Inner>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_counter(&self, name: &str) {
        {
            let mut counters = self.inner.counters.lock();
            *counters.entry(name.to_string()).or_insert(0) += 1;
        }
        metrics::counter!(name.to_string()).increment(1);
    }

    pub fn record_duration(&self, name: &str, duration: Duration) {
        self.record_value(name, duration.as_secs_f64() * 1000.0);
    }

    pub fn record_value(&self, name: &str, value: f64) {
        if !value.is_finite() {
            debug!(metric = name, value, "dropping non-finite sample");
            return;
        }
        {
            let mut windows = self.inner.windows.lock();
            let window = windows
                .entry(name.to_string())
                .or_insert_with(|| VecDeque::with_capacity(WINDOW_CAPACITY));
            if window.len() == WINDOW_CAPACITY {
                window.pop_front();
            }
            window.push_back(value);
        }
        metrics::histogram!(name.to_string()).record(value);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let counters = self.inner.counters.lock().clone();
        let windows = self
            .inner
            .windows
            .lock()
            .iter()
            .map(|(name, window)| (name.clone(), window_stats(window)))
            .collect();
        MetricsSnapshot { counters, windows }
    }
}

fn window_stats(window: &VecDeque<f64>) -> WindowStats {
    let count = window.len();
    if count == 0 {
        return WindowStats {
            count: 0,
            mean: 0.0,
            p95: 0.0,
        };
    }
    let mean = window.iter().sum::<f64>() / count as f64;

    let mut sorted: Vec<f64> = window.iter().copied().collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = ((count as f64 * 0.95).ceil() as usize).clamp(1, count);
    let p95 = sorted[rank - 1];

    WindowStats { count, mean, p95 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let collector = MetricsCollector::new();
        collector.incr_counter("turns_total");
        collector.incr_counter("turns_total");
        collector.incr_counter("escalations_total");

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.counters["turns_total"], 2);
        assert_eq!(snapshot.counters["escalations_total"], 1);
    }

    #[test]
    fn test_window_stats_mean_and_p95() {
        let collector = MetricsCollector::new();
        for v in 1..=100 {
            collector.record_value("latency_ms", v as f64);
        }
        let stats = &collector.snapshot().windows["latency_ms"];
        assert_eq!(stats.count, 100);
        assert!((stats.mean - 50.5).abs() < 1e-9);
        assert_eq!(stats.p95, 95.0);
    }

    #[test]
    fn test_window_is_bounded() {
        let collector = MetricsCollector::new();
        for v in 0..(WINDOW_CAPACITY + 100) {
            collector.record_value("latency_ms", v as f64);
        }
        let stats = &collector.snapshot().windows["latency_ms"];
        assert_eq!(stats.count, WINDOW_CAPACITY);
        // Oldest samples were evicted.
        assert!(stats.mean > 100.0);
    }

    #[test]
    fn test_non_finite_samples_dropped() {
        let collector = MetricsCollector::new();
        collector.record_value("latency_ms", f64::NAN);
        assert!(collector.snapshot().windows.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let collector = MetricsCollector::new();
        let clone = collector.clone();
        clone.incr_counter("turns_total");
        assert_eq!(collector.snapshot().counters["turns_total"], 1);
    }
}
