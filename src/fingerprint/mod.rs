//! Content fingerprints
//!
//! Two interchangeable SHA-256 based algorithms:
//! - exhaustive: every byte, chunk by chunk, yielding to the runtime between
//!   idle slices
//! - sampled ("shadow"): first chunk, last region and 2-byte spot checks of every
//!   interior region, hashed in one pass
//!
//! Fingerprints carry their mode. Two fingerprints only compare equal when both
//! the mode and the digest match.

mod exhaustive;
mod sampled;

use std::fmt;

use serde::Serialize;

pub use exhaustive::{exhaustive_fingerprint, ExhaustiveHasher};
pub use sampled::{sample_ranges, sampled_fingerprint};

/// How a fingerprint was computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintMode {
    Exhaustive,
    Sampled,
}

/// Hex SHA-256 digest tagged with the mode that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint {
    mode: FingerprintMode,
    digest: String,
}

impl Fingerprint {
    pub(crate) fn new(mode: FingerprintMode, digest: String) -> Self {
        Self { mode, digest }
    }

    pub fn mode(&self) -> FingerprintMode {
        self.mode
    }

    /// 64 lowercase hex characters
    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digest)
    }
}
