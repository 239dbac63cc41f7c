//! Chunk planning and transport envelopes

mod envelope;
mod planner;

pub use envelope::{ChunkEnvelope, EnvelopeMetadata};
pub use planner::{Chunk, ChunkPlanner};
