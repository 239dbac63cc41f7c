//! Slow-start style chunk size control

use std::time::Duration;

use tracing::debug;

/// Lower bound of the latency ratio (at most 2x growth per round)
pub const MIN_RATE: f64 = 0.5;
/// Upper bound of the latency ratio (at most 2x shrink per round)
pub const MAX_RATE: f64 = 2.0;
/// Chunk size never drops below one byte, so the cursor always advances
pub const MIN_CHUNK_SIZE: u64 = 1;

/// Direction of a chunk size change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeAdjustment {
    Grow,
    Shrink,
    Hold,
}

/// Result of feeding one round-trip measurement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Clamped `elapsed / threshold`
    pub rate: f64,
    pub previous_size: u64,
    pub next_size: u64,
    pub adjustment: SizeAdjustment,
}

/// Mutable congestion state of one adaptive session.
///
/// Updated exactly once per round from the preceding transport call.
#[derive(Debug, Clone)]
pub struct CongestionParameters {
    current_chunk_size: u64,
    slow_start_threshold: Duration,
}

impl CongestionParameters {
    pub fn new(initial_chunk_size: u64, slow_start_threshold: Duration) -> Self {
        Self {
            current_chunk_size: initial_chunk_size.max(MIN_CHUNK_SIZE),
            slow_start_threshold,
        }
    }

    pub fn current_chunk_size(&self) -> u64 {
        self.current_chunk_size
    }

    pub fn slow_start_threshold(&self) -> Duration {
        self.slow_start_threshold
    }

    /// `elapsed / threshold` clamped into `[MIN_RATE, MAX_RATE]`
    pub fn rate_for(&self, elapsed: Duration) -> f64 {
        let threshold = self.slow_start_threshold.as_secs_f64();
        if threshold <= 0.0 {
            return MAX_RATE;
        }
        (elapsed.as_secs_f64() / threshold).clamp(MIN_RATE, MAX_RATE)
    }

    /// Apply `floor(size / rate)`: fast rounds grow the next chunk, slow ones shrink it
    pub fn observe(&mut self, elapsed: Duration) -> Observation {
        let rate = self.rate_for(elapsed);
        let previous_size = self.current_chunk_size;
        let next_size = ((previous_size as f64 / rate).floor() as u64).max(MIN_CHUNK_SIZE);
        self.current_chunk_size = next_size;

        let adjustment = match next_size.cmp(&previous_size) {
            std::cmp::Ordering::Greater => SizeAdjustment::Grow,
            std::cmp::Ordering::Less => SizeAdjustment::Shrink,
            std::cmp::Ordering::Equal => SizeAdjustment::Hold,
        };

        debug!(
            "Chunk size {:?}: {}→{} bytes (elapsed={}ms, rate={:.2})",
            adjustment,
            previous_size,
            next_size,
            elapsed.as_millis(),
            rate
        );

        Observation {
            rate,
            previous_size,
            next_size,
            adjustment,
        }
    }
}
