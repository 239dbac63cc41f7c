//! tcpss-upload library - chunked upload orchestration with batched and
//! slow-start adaptive scheduling

pub mod chunk;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod scheduler;
pub mod source;
pub mod strategy;
pub mod transport;

// Re-export commonly used types
pub use chunk::{Chunk, ChunkEnvelope, ChunkPlanner};
pub use config::{Config, ConfigOptions, Strategy};
pub use error::UploadError;
pub use fingerprint::{Fingerprint, FingerprintMode};
pub use scheduler::{
    upload, AdaptiveUploadScheduler, BatchUploadScheduler, RecordDetail, ResponseRecord,
    SessionState, UploadScheduler,
};
pub use source::{ByteSource, FileSource, MemorySource};
pub use transport::{Transport, TransportResponse};
