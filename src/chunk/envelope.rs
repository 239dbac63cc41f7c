//! Chunk envelopes - the unit handed to the transport

use serde::Serialize;

use crate::chunk::Chunk;
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::source::ByteSource;

/// A chunk together with its bytes, the parent fingerprint and the source name
#[derive(Debug, Clone)]
pub struct ChunkEnvelope {
    pub chunk: Chunk,
    pub data: Vec<u8>,
    pub fingerprint: Fingerprint,
    pub name: String,
}

/// Serializable view of an envelope without the payload bytes
#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeMetadata<'a> {
    pub hash: &'a str,
    pub name: &'a str,
    pub id: usize,
    pub offset: u64,
    pub len: u64,
}

impl ChunkEnvelope {
    /// Read the chunk's bytes from `source` and wrap them
    pub fn read(source: &dyn ByteSource, chunk: Chunk, fingerprint: &Fingerprint) -> Result<Self> {
        let data = source.read(chunk.range())?;
        Ok(Self {
            chunk,
            data,
            fingerprint: fingerprint.clone(),
            name: source.name().to_string(),
        })
    }

    pub fn metadata(&self) -> EnvelopeMetadata<'_> {
        EnvelopeMetadata {
            hash: self.fingerprint.digest(),
            name: &self.name,
            id: self.chunk.index,
            offset: self.chunk.offset,
            len: self.chunk.len,
        }
    }
}
