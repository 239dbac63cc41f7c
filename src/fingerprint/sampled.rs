//! Sampled ("shadow") fingerprint

use std::ops::Range;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;
use crate::fingerprint::{Fingerprint, FingerprintMode};
use crate::source::ByteSource;

/// Spot-check width at the start, middle and end of interior regions
const SPOT_LEN: u64 = 2;

/// Byte ranges read by the sampled fingerprint, in source order.
///
/// Sources no larger than `chunk_size` are read whole. Otherwise: the first
/// `chunk_size` bytes, the last region in full, and three spot checks of every
/// region in between. Spot checks are clipped to their region.
pub fn sample_ranges(source_len: u64, chunk_size: u64) -> Vec<Range<u64>> {
    assert!(chunk_size > 0, "chunk size must be positive");

    if source_len <= chunk_size {
        return vec![0..source_len];
    }

    let mut ranges = vec![0..chunk_size];
    let mut cur = chunk_size;
    while cur < source_len {
        let end = (cur + chunk_size).min(source_len);
        if end == source_len {
            ranges.push(cur..end);
        } else {
            let mid = cur + chunk_size / 2;
            let clip = |r: Range<u64>| r.start.max(cur)..r.end.min(end);
            ranges.push(clip(cur..cur + SPOT_LEN));
            ranges.push(clip(mid..mid + SPOT_LEN));
            ranges.push(clip(end.saturating_sub(SPOT_LEN)..end));
        }
        cur = end;
    }
    ranges
}

/// Hash the sampled ranges of `source` in one uninterrupted pass
pub fn sampled_fingerprint(source: &dyn ByteSource, chunk_size: u64) -> Result<Fingerprint> {
    let ranges = sample_ranges(source.len(), chunk_size);

    let mut buffer = Vec::new();
    for range in &ranges {
        buffer.extend_from_slice(&source.read(range.clone())?);
    }

    debug!(
        "Sampled hash of '{}': {} ranges, {} of {} bytes read",
        source.name(),
        ranges.len(),
        buffer.len(),
        source.len()
    );

    Ok(Fingerprint::new(
        FingerprintMode::Sampled,
        hex::encode(Sha256::digest(&buffer)),
    ))
}
