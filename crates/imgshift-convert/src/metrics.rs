//! Conversion metrics.
//!
//! Tracks conversion counts, durations, and failure rates. Counters are
//! atomics; duration samples sit behind a mutex.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Maximum number of duration samples to keep in memory.
const MAX_DURATION_SAMPLES: usize = 1000;

/// Conversion metrics collector, shared across requests.
#[derive(Debug)]
pub struct ConversionMetrics {
    conversions_started: AtomicU64,
    conversions_succeeded: AtomicU64,
    conversions_failed: AtomicU64,
    conversions_rejected: AtomicU64,
    conversions_timed_out: AtomicU64,
    total_input_bytes: AtomicU64,
    total_output_bytes: AtomicU64,
    duration_samples: Mutex<Vec<Duration>>,
}

impl ConversionMetrics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self {
            conversions_started: AtomicU64::new(0),
            conversions_succeeded: AtomicU64::new(0),
            conversions_failed: AtomicU64::new(0),
            conversions_rejected: AtomicU64::new(0),
            conversions_timed_out: AtomicU64::new(0),
            total_input_bytes: AtomicU64::new(0),
            total_output_bytes: AtomicU64::new(0),
            duration_samples: Mutex::new(Vec::with_capacity(MAX_DURATION_SAMPLES)),
        }
    }

    /// Record a request entering the service.
    pub fn record_started(&self, input_bytes: u64) {
        self.conversions_started.fetch_add(1, Ordering::Relaxed);
        self.total_input_bytes
            .fetch_add(input_bytes, Ordering::Relaxed);
    }

    /// Record a successful conversion.
    pub fn record_success(&self, duration: Duration, output_bytes: u64) {
        self.conversions_succeeded.fetch_add(1, Ordering::Relaxed);
        self.total_output_bytes
            .fetch_add(output_bytes, Ordering::Relaxed);
        self.add_duration_sample(duration);
    }

    /// Record a request rejected for a client error.
    pub fn record_rejected(&self) {
        self.conversions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a backend failure.
    pub fn record_failure(&self) {
        self.conversions_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a backend timeout. Also counts as a failure.
    pub fn record_timeout(&self) {
        self.conversions_timed_out.fetch_add(1, Ordering::Relaxed);
        self.conversions_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn add_duration_sample(&self, duration: Duration) {
        if let Ok(mut samples) = self.duration_samples.lock() {
            if samples.len() >= MAX_DURATION_SAMPLES {
                samples.remove(0);
            }
            samples.push(duration);
        }
    }

    /// Current values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let durations = self
            .duration_samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();

        let (p50, p95, p99) = calculate_percentiles(&durations);

        MetricsSnapshot {
            started: self.conversions_started.load(Ordering::Relaxed),
            succeeded: self.conversions_succeeded.load(Ordering::Relaxed),
            failed: self.conversions_failed.load(Ordering::Relaxed),
            rejected: self.conversions_rejected.load(Ordering::Relaxed),
            timed_out: self.conversions_timed_out.load(Ordering::Relaxed),
            total_input_bytes: self.total_input_bytes.load(Ordering::Relaxed),
            total_output_bytes: self.total_output_bytes.load(Ordering::Relaxed),
            duration_p50_ms: p50.map(as_millis),
            duration_p95_ms: p95.map(as_millis),
            duration_p99_ms: p99.map(as_millis),
            sample_count: durations.len() as u64,
        }
    }
}

impl Default for ConversionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn as_millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

fn calculate_percentiles(
    durations: &[Duration],
) -> (Option<Duration>, Option<Duration>, Option<Duration>) {
    if durations.is_empty() {
        return (None, None, None);
    }

    let mut sorted = durations.to_vec();
    sorted.sort();
    let len = sorted.len();

    let p50 = sorted.get(len * 50 / 100).copied();
    let p95 = sorted.get(len * 95 / 100).copied();
    let p99 = sorted.get(len.saturating_sub(1) * 99 / 100).copied();

    (p50, p95, p99)
}

/// A point-in-time view of [`ConversionMetrics`], reported on `/health`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Requests that reached the service.
    pub started: u64,
    /// Successful conversions.
    pub succeeded: u64,
    /// Backend failures, timeouts included.
    pub failed: u64,
    /// Requests rejected before the backend ran.
    pub rejected: u64,
    /// Backend timeouts.
    pub timed_out: u64,
    /// Bytes received.
    pub total_input_bytes: u64,
    /// Bytes produced.
    pub total_output_bytes: u64,
    /// Median pipeline time.
    pub duration_p50_ms: Option<u64>,
    /// 95th percentile pipeline time.
    pub duration_p95_ms: Option<u64>,
    /// 99th percentile pipeline time.
    pub duration_p99_ms: Option<u64>,
    /// Number of duration samples collected.
    pub sample_count: u64,
}
