//! Fixed-concurrency windowed delivery

use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::chunk::{ChunkEnvelope, ChunkPlanner};
use crate::config::{Config, Strategy};
use crate::error::Result;
use crate::fingerprint::exhaustive_fingerprint;
use crate::scheduler::{
    accept_response, new_session_id, RecordDetail, ResponseRecord, SessionState, StatusTracker,
    UploadScheduler,
};
use crate::source::ByteSource;
use crate::strategy::{LatencyMetrics, RoundTrip};
use crate::transport::Transport;

/// Uploads precomputed chunks in windows of `concurrence` concurrent calls.
///
/// Window k+1 is issued only after every call of window k has resolved, so at
/// most `concurrence` calls are ever in flight.
pub struct BatchUploadScheduler<T> {
    transport: T,
    concurrence: usize,
    async_mode: bool,
    chunk_size: u64,
    hash_slice: Duration,
    session_id: String,
    status: StatusTracker,
}

impl<T: Transport> BatchUploadScheduler<T> {
    pub fn new(transport: T, config: &Config) -> Self {
        debug_assert!(config.concurrence > 0, "concurrence must be positive");
        let session_id = new_session_id();
        Self {
            transport,
            concurrence: config.concurrence,
            async_mode: config.async_mode,
            chunk_size: config.chunk_size,
            hash_slice: config.hash_slice,
            status: StatusTracker::new(session_id.clone()),
            session_id,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn run(&self, source: &dyn ByteSource, records: &mut Vec<ResponseRecord>) -> Result<()> {
        self.status.transition(SessionState::CalculatingHash);
        let chunks = ChunkPlanner::new(self.chunk_size).plan(source.len());
        let fingerprint = exhaustive_fingerprint(source, chunks.clone(), self.hash_slice).await?;
        info!(
            "Session {}: '{}' fingerprint {} ({} chunks)",
            self.session_id,
            source.name(),
            fingerprint,
            chunks.len()
        );

        // Status stays CalculatingHash: no upload phase is entered
        if !self.async_mode {
            info!(
                "Session {}: batched delivery disabled, {} chunks not sent",
                self.session_id,
                chunks.len()
            );
            return Ok(());
        }

        self.status.transition(SessionState::Uploading);

        let total_windows = chunks.len().div_ceil(self.concurrence);
        let mut metrics = LatencyMetrics::default();
        let mut sequence_id = 0usize;

        for (i, window) in chunks.chunks(self.concurrence).enumerate() {
            let batch_id = i + 1;
            let envelopes = window
                .iter()
                .map(|chunk| ChunkEnvelope::read(source, *chunk, &fingerprint))
                .collect::<Result<Vec<_>>>()?;

            debug!(
                "Uploading window {}/{} ({} chunks)...",
                batch_id,
                total_windows,
                envelopes.len()
            );

            let started = Instant::now();
            let responses =
                join_all(envelopes.into_iter().map(|e| self.transport.send(e))).await;
            metrics.record(RoundTrip {
                bytes: window.iter().map(|c| c.len).sum(),
                elapsed: started.elapsed(),
            });

            for response in responses {
                sequence_id += 1;
                let response = accept_response(response, sequence_id)?;
                records.push(ResponseRecord::from_response(
                    Strategy::Batched,
                    response,
                    RecordDetail::Batched {
                        batch_id,
                        sequence_id,
                    },
                ));
            }
        }

        info!(
            "Session {}: {} chunks delivered in {} windows (ewma={:.0}ms)",
            self.session_id,
            sequence_id,
            metrics.total_calls(),
            metrics.ewma_latency_ms()
        );
        Ok(())
    }
}

impl<T: Transport> UploadScheduler for BatchUploadScheduler<T> {
    fn status(&self) -> watch::Receiver<SessionState> {
        self.status.subscribe()
    }

    async fn begin_session(self, source: &dyn ByteSource) -> Vec<ResponseRecord> {
        info!(
            "Session {}: batched upload of '{}' ({} bytes, concurrence={})",
            self.session_id,
            source.name(),
            source.len(),
            self.concurrence
        );

        let mut records = Vec::new();
        if let Err(e) = self.run(source, &mut records).await {
            error!(
                "Session {} failed while {:?}: {}",
                self.session_id,
                self.status.current(),
                e
            );
            self.status.fail();
            records.push(ResponseRecord::failure(
                Strategy::Batched,
                &e,
                RecordDetail::Failed {
                    concurrence: Some(self.concurrence),
                    error_index: None,
                },
            ));
        }
        records
    }
}
