//! Response records - one per transport call, plus an optional failure record

use serde::Serialize;
use serde_json::Value;

use crate::chunk::Chunk;
use crate::config::Strategy;
use crate::error::UploadError;
use crate::transport::TransportResponse;

/// Bookkeeping attached to a record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordDetail {
    Batched {
        /// Window number, starting at 1
        batch_id: usize,
        /// Global request number, starting at 1
        sequence_id: usize,
    },
    Adaptive {
        sequence_id: usize,
        /// Bytes delivered so far, this chunk included
        uploaded_size: u64,
        elapsed_ms: u64,
        rate: f64,
        chunk: Chunk,
    },
    /// Synthetic record appended when a session aborts
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        concurrence: Option<usize>,
        /// Adaptive only: chunks started before the failure
        #[serde(skip_serializing_if = "Option::is_none")]
        error_index: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    pub success: bool,
    pub data: Value,
    pub message: String,
    pub strategy: Strategy,
    #[serde(flatten)]
    pub detail: RecordDetail,
}

impl ResponseRecord {
    pub(crate) fn from_response(
        strategy: Strategy,
        response: TransportResponse,
        detail: RecordDetail,
    ) -> Self {
        Self {
            success: response.success,
            data: response.data,
            message: response.message,
            strategy,
            detail,
        }
    }

    pub(crate) fn failure(strategy: Strategy, error: &UploadError, detail: RecordDetail) -> Self {
        Self {
            success: false,
            data: Value::Null,
            message: error.to_string(),
            strategy,
            detail,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.detail, RecordDetail::Failed { .. })
    }

    pub fn sequence_id(&self) -> Option<usize> {
        match self.detail {
            RecordDetail::Batched { sequence_id, .. } | RecordDetail::Adaptive { sequence_id, .. } => {
                Some(sequence_id)
            }
            RecordDetail::Failed { .. } => None,
        }
    }
}
