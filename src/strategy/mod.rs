//! Adaptive sizing module
//!
//! Slow-start style chunk size control driven by per-call latency, plus
//! smoothed round-trip metrics for diagnostics.

mod congestion;
mod metrics;

pub use congestion::{
    CongestionParameters, Observation, SizeAdjustment, MAX_RATE, MIN_CHUNK_SIZE, MIN_RATE,
};
pub use metrics::{LatencyMetrics, RoundTrip};
