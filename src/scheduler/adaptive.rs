//! Sequential delivery with slow-start style chunk sizing

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::chunk::{Chunk, ChunkEnvelope};
use crate::config::{Config, Strategy, DEFAULT_CHUNK_SIZE, DEFAULT_SLOW_START_THRESHOLD_MS};
use crate::error::Result;
use crate::fingerprint::sampled_fingerprint;
use crate::scheduler::{
    accept_response, new_session_id, RecordDetail, ResponseRecord, SessionState, StatusTracker,
    UploadScheduler,
};
use crate::source::ByteSource;
use crate::strategy::{CongestionParameters, LatencyMetrics, RoundTrip};
use crate::transport::Transport;

/// State owned by one running session
struct AdaptiveSession {
    cursor: u64,
    /// Chunks handed to the transport so far; a chunk whose bytes could not
    /// be read is not counted
    started: usize,
    uploaded: u64,
    params: CongestionParameters,
    metrics: LatencyMetrics,
    records: Vec<ResponseRecord>,
}

/// Uploads one chunk at a time, resizing the next chunk from the latency of
/// the previous call.
pub struct AdaptiveUploadScheduler<T> {
    transport: T,
    initial_chunk_size: u64,
    slow_start_threshold: Duration,
    session_id: String,
    status: StatusTracker,
}

impl<T: Transport> AdaptiveUploadScheduler<T> {
    /// Defaults: 2 MiB first chunk, 1000ms slow-start threshold
    pub fn new(transport: T) -> Self {
        Self::build(
            transport,
            DEFAULT_CHUNK_SIZE,
            Duration::from_millis(DEFAULT_SLOW_START_THRESHOLD_MS),
        )
    }

    pub fn with_config(transport: T, config: &Config) -> Self {
        Self::build(transport, config.chunk_size, config.slow_start_threshold)
    }

    fn build(transport: T, initial_chunk_size: u64, slow_start_threshold: Duration) -> Self {
        let session_id = new_session_id();
        Self {
            transport,
            initial_chunk_size,
            slow_start_threshold,
            status: StatusTracker::new(session_id.clone()),
            session_id,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn run(&self, source: &dyn ByteSource, session: &mut AdaptiveSession) -> Result<()> {
        self.status.transition(SessionState::CalculatingHash);
        let fingerprint = sampled_fingerprint(source, self.initial_chunk_size)?;
        info!(
            "Session {}: '{}' sampled fingerprint {}",
            self.session_id,
            source.name(),
            fingerprint
        );

        let total = source.len();
        while session.cursor < total {
            self.status.transition(SessionState::Uploading);

            let len = session
                .params
                .current_chunk_size()
                .min(total - session.cursor);
            let chunk = Chunk {
                index: session.started,
                offset: session.cursor,
                len,
            };
            let envelope = ChunkEnvelope::read(source, chunk, &fingerprint)?;
            session.started += 1;
            let sequence_id = session.started;

            let start = Instant::now();
            let result = self.transport.send(envelope).await;
            let elapsed = start.elapsed();
            let response = accept_response(result, sequence_id)?;

            let observation = session.params.observe(elapsed);
            session.cursor += len;
            session.uploaded += len;
            session.metrics.record(RoundTrip {
                bytes: len,
                elapsed,
            });

            debug!(
                "Chunk {} delivered: {} bytes in {}ms, next size {}",
                sequence_id,
                len,
                elapsed.as_millis(),
                observation.next_size
            );

            session.records.push(ResponseRecord::from_response(
                Strategy::Adaptive,
                response,
                RecordDetail::Adaptive {
                    sequence_id,
                    uploaded_size: session.uploaded,
                    elapsed_ms: elapsed.as_millis() as u64,
                    rate: observation.rate,
                    chunk,
                },
            ));
            self.status.transition(SessionState::RequestFinished);
        }

        info!(
            "Session {}: {} bytes in {} calls (ewma={:.0}ms, throughput={:.0}B/s, final chunk size {})",
            self.session_id,
            session.uploaded,
            session.metrics.total_calls(),
            session.metrics.ewma_latency_ms(),
            session.metrics.throughput_bytes_per_sec(),
            session.params.current_chunk_size()
        );
        Ok(())
    }
}

impl<T: Transport> UploadScheduler for AdaptiveUploadScheduler<T> {
    fn status(&self) -> watch::Receiver<SessionState> {
        self.status.subscribe()
    }

    async fn begin_session(self, source: &dyn ByteSource) -> Vec<ResponseRecord> {
        info!(
            "Session {}: adaptive upload of '{}' ({} bytes, initial chunk={}, ssthresh={}ms)",
            self.session_id,
            source.name(),
            source.len(),
            self.initial_chunk_size,
            self.slow_start_threshold.as_millis()
        );

        let mut session = AdaptiveSession {
            cursor: 0,
            started: 0,
            uploaded: 0,
            params: CongestionParameters::new(self.initial_chunk_size, self.slow_start_threshold),
            metrics: LatencyMetrics::default(),
            records: Vec::new(),
        };

        if let Err(e) = self.run(source, &mut session).await {
            error!(
                "Session {} failed while {:?} after {} chunks: {}",
                self.session_id,
                self.status.current(),
                session.started,
                e
            );
            self.status.fail();
            session.records.push(ResponseRecord::failure(
                Strategy::Adaptive,
                &e,
                RecordDetail::Failed {
                    concurrence: None,
                    error_index: Some(session.started),
                },
            ));
        }
        session.records
    }
}
