//! Exhaustive fingerprint with cooperative idle-slice scheduling

use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::chunk::Chunk;
use crate::error::Result;
use crate::fingerprint::{Fingerprint, FingerprintMode};
use crate::source::ByteSource;

/// Resumable hashing state: the running accumulator and the next chunk to feed.
///
/// Each `step` reads and hashes exactly one chunk. Stopping between steps and
/// continuing later keeps the accumulator, so nothing is re-read. `finish`
/// consumes the hasher; a completed hash cannot be restarted.
pub struct ExhaustiveHasher {
    chunks: Vec<Chunk>,
    next: usize,
    hasher: Sha256,
}

impl ExhaustiveHasher {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self {
            chunks,
            next: 0,
            hasher: Sha256::new(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.next >= self.chunks.len()
    }

    /// Chunks hashed so far
    pub fn progress(&self) -> usize {
        self.next
    }

    /// Hash the next chunk. Returns `false` once every chunk has been fed.
    pub fn step(&mut self, source: &dyn ByteSource) -> Result<bool> {
        let Some(chunk) = self.chunks.get(self.next) else {
            return Ok(false);
        };
        let bytes = source.read(chunk.range())?;
        self.hasher.update(&bytes);
        self.next += 1;
        Ok(true)
    }

    pub fn finish(self) -> Fingerprint {
        Fingerprint::new(
            FingerprintMode::Exhaustive,
            hex::encode(self.hasher.finalize()),
        )
    }
}

/// Hash every chunk of `source` in index order.
///
/// Work runs in idle slices of `slice`: chunks are hashed until the slice is
/// spent, then the task yields to the runtime and picks up where it stopped.
/// At least one chunk is hashed per slice, so a zero slice still progresses.
pub async fn exhaustive_fingerprint(
    source: &dyn ByteSource,
    chunks: Vec<Chunk>,
    slice: Duration,
) -> Result<Fingerprint> {
    let mut hasher = ExhaustiveHasher::new(chunks);
    let mut slices = 0usize;

    while !hasher.is_done() {
        let deadline = Instant::now() + slice;
        loop {
            if !hasher.step(source)? || Instant::now() >= deadline {
                break;
            }
        }
        slices += 1;
        if !hasher.is_done() {
            tokio::task::yield_now().await;
        }
    }

    debug!(
        "Exhaustive hash of '{}': {} chunks in {} idle slices",
        source.name(),
        hasher.progress(),
        slices
    );
    Ok(hasher.finish())
}
