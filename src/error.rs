//! Error taxonomy for upload sessions

use thiserror::Error;

/// Errors that can end an upload session or reject a configuration
#[derive(Debug, Error)]
pub enum UploadError {
    /// A byte range of the source could not be read
    #[error("cannot read {len} bytes at offset {offset} from '{name}': {reason}")]
    UnreadableSource {
        name: String,
        offset: u64,
        len: u64,
        reason: String,
    },

    /// The transport rejected the call or answered with a failure indication
    #[error("transport failed on request {sequence}: {message}")]
    TransportFailure { sequence: usize, message: String },

    /// Invalid chunk size, concurrency width or threshold
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl UploadError {
    pub(crate) fn unreadable(
        name: &str,
        offset: u64,
        len: u64,
        reason: impl std::fmt::Display,
    ) -> Self {
        UploadError::UnreadableSource {
            name: name.to_string(),
            offset,
            len,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;
