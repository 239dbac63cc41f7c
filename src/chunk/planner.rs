//! Fixed-size chunk planning

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A contiguous byte range `[offset, offset + len)` of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Sequence index, starting at 0
    pub index: usize,
    pub offset: u64,
    pub len: u64,
}

impl Chunk {
    pub fn end(&self) -> u64 {
        self.offset + self.len
    }

    pub fn range(&self) -> Range<u64> {
        self.offset..self.end()
    }
}

/// Splits a source into fixed-size contiguous chunks
#[derive(Debug, Clone, Copy)]
pub struct ChunkPlanner {
    chunk_size: u64,
}

impl ChunkPlanner {
    /// Panics on a zero chunk size; `Config::new` rejects it earlier.
    pub fn new(chunk_size: u64) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Number of chunks a source of `source_len` bytes splits into
    pub fn chunk_count(&self, source_len: u64) -> usize {
        source_len.div_ceil(self.chunk_size) as usize
    }

    /// Chunks covering `[0, source_len)`; the last one may be short
    pub fn plan(&self, source_len: u64) -> Vec<Chunk> {
        let mut chunks = Vec::with_capacity(self.chunk_count(source_len));
        let mut offset = 0u64;
        while offset < source_len {
            let len = self.chunk_size.min(source_len - offset);
            chunks.push(Chunk {
                index: chunks.len(),
                offset,
                len,
            });
            offset += len;
        }
        chunks
    }
}
