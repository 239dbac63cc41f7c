//! Upload schedulers
//!
//! Two strategies share one capability: start a session over a byte source
//! and return every response record once the session ends. A session ends at
//! the first error; the error becomes a trailing failure record and partial
//! results are kept.

mod adaptive;
mod batch;
mod record;
mod status;

use tokio::sync::watch;

pub use adaptive::AdaptiveUploadScheduler;
pub use batch::BatchUploadScheduler;
pub use record::{RecordDetail, ResponseRecord};
pub use status::{SessionState, StatusTracker};

use crate::config::{Config, Strategy};
use crate::error::{Result, UploadError};
use crate::source::ByteSource;
use crate::transport::{Transport, TransportResponse};

/// A single-use upload session driver
#[allow(async_fn_in_trait)]
pub trait UploadScheduler {
    /// Observe status transitions. Receivers outlive the session.
    fn status(&self) -> watch::Receiver<SessionState>;

    /// Run one session to completion. Consumes the scheduler; a new source
    /// needs a new scheduler.
    async fn begin_session(self, source: &dyn ByteSource) -> Vec<ResponseRecord>;
}

/// Run a session with the strategy selected in `config`
pub async fn upload<T: Transport>(
    config: &Config,
    source: &dyn ByteSource,
    transport: T,
) -> Vec<ResponseRecord> {
    match config.strategy {
        Strategy::Batched => {
            BatchUploadScheduler::new(transport, config)
                .begin_session(source)
                .await
        }
        Strategy::Adaptive => {
            AdaptiveUploadScheduler::with_config(transport, config)
                .begin_session(source)
                .await
        }
    }
}

/// Turn a transport outcome into a successful response or a `TransportFailure`
fn accept_response(
    result: anyhow::Result<TransportResponse>,
    sequence: usize,
) -> Result<TransportResponse> {
    match result {
        Ok(response) if response.success => Ok(response),
        Ok(response) => Err(UploadError::TransportFailure {
            sequence,
            message: if response.message.is_empty() {
                "transport reported failure".to_string()
            } else {
                response.message
            },
        }),
        Err(e) => Err(UploadError::TransportFailure {
            sequence,
            message: format!("{:#}", e),
        }),
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
