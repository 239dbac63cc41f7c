//! Round-trip metrics with EWMA smoothing

use std::collections::VecDeque;
use std::time::Duration;

/// EWMA smoothing factor (higher = more responsive to recent values)
pub const DEFAULT_EWMA_ALPHA: f64 = 0.2;
/// Number of recent round trips kept for throughput estimates
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// One completed transport call
#[derive(Debug, Clone, Copy)]
pub struct RoundTrip {
    pub bytes: u64,
    pub elapsed: Duration,
}

/// Latency and throughput observed during a session.
///
/// Diagnostic only: the chunk size rule reads raw per-call latency, never these
/// smoothed values.
pub struct LatencyMetrics {
    alpha: f64,
    ewma_latency_ms: f64,
    samples: VecDeque<RoundTrip>,
    window_size: usize,
    total_calls: usize,
    initialized: bool,
}

impl LatencyMetrics {
    pub fn new(alpha: f64, window_size: usize) -> Self {
        Self {
            alpha,
            ewma_latency_ms: 0.0,
            samples: VecDeque::with_capacity(window_size),
            window_size: window_size.max(1),
            total_calls: 0,
            initialized: false,
        }
    }

    pub fn record(&mut self, sample: RoundTrip) {
        let latency = sample.elapsed.as_secs_f64() * 1000.0;
        if !self.initialized {
            self.ewma_latency_ms = latency;
            self.initialized = true;
        } else {
            self.ewma_latency_ms = self.alpha * latency + (1.0 - self.alpha) * self.ewma_latency_ms;
        }

        if self.samples.len() >= self.window_size {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
        self.total_calls += 1;
    }

    pub fn ewma_latency_ms(&self) -> f64 {
        self.ewma_latency_ms
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls
    }

    /// Bytes per second across the retained window
    pub fn throughput_bytes_per_sec(&self) -> f64 {
        let bytes: u64 = self.samples.iter().map(|s| s.bytes).sum();
        let secs: f64 = self.samples.iter().map(|s| s.elapsed.as_secs_f64()).sum();
        if secs <= 0.0 {
            return 0.0;
        }
        bytes as f64 / secs
    }
}

impl Default for LatencyMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_EWMA_ALPHA, DEFAULT_WINDOW_SIZE)
    }
}
