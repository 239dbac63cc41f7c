//! Tests for the adaptive scheduler

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use serde_json::json;
use tcpss_upload::config::{Config, ConfigOptions, Strategy};
use tcpss_upload::error::Result as UploadResult;
use tcpss_upload::fingerprint::sampled_fingerprint;
use tcpss_upload::{
    upload, AdaptiveUploadScheduler, ByteSource, Chunk, ChunkEnvelope, FingerprintMode,
    MemorySource, RecordDetail, ResponseRecord, SessionState, Transport, TransportResponse,
    UploadError, UploadScheduler,
};

const MIB: u64 = 1024 * 1024;

/// Sleeps for scripted latencies (then `fallback_ms`) and echoes the envelope
#[derive(Clone)]
struct ScriptedTransport {
    latencies: Arc<Mutex<VecDeque<u64>>>,
    fallback_ms: u64,
    in_flight: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    hashes: Arc<Mutex<Vec<String>>>,
    reject: Option<usize>,
}

impl ScriptedTransport {
    fn new(latencies: &[u64], fallback_ms: u64) -> Self {
        Self {
            latencies: Arc::new(Mutex::new(latencies.iter().copied().collect())),
            fallback_ms,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            hashes: Arc::new(Mutex::new(Vec::new())),
            reject: None,
        }
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, envelope: ChunkEnvelope) -> anyhow::Result<TransportResponse> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let latency = self
            .latencies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback_ms);
        tokio::time::sleep(Duration::from_millis(latency)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.hashes
            .lock()
            .unwrap()
            .push(envelope.fingerprint.digest().to_string());

        if self.reject == Some(envelope.chunk.index) {
            return Err(anyhow!("upstream closed at chunk {}", envelope.chunk.index));
        }
        Ok(TransportResponse::ok(json!({ "id": envelope.chunk.index })))
    }
}

/// Fails any read longer than two bytes that starts at `bad_from`
struct DamagedSource {
    inner: MemorySource,
    bad_from: u64,
}

impl ByteSource for DamagedSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn len(&self) -> u64 {
        self.inner.len()
    }

    fn read(&self, range: Range<u64>) -> UploadResult<Vec<u8>> {
        if range.start == self.bad_from && range.end - range.start > 2 {
            return Err(UploadError::UnreadableSource {
                name: self.name().to_string(),
                offset: range.start,
                len: range.end - range.start,
                reason: "bad sector".to_string(),
            });
        }
        self.inner.read(range)
    }
}

fn source(len: usize) -> MemorySource {
    MemorySource::new("video.mp4", (0..len).map(|i| (i % 241) as u8).collect::<Vec<u8>>())
}

fn config(chunk_size: u64, threshold_ms: u64) -> Arc<Config> {
    Config::new(ConfigOptions {
        strategy: Some(Strategy::Adaptive),
        chunk_size: Some(chunk_size),
        slow_start_threshold_ms: Some(threshold_ms),
        ..Default::default()
    })
    .unwrap()
}

struct Step {
    sequence_id: usize,
    uploaded_size: u64,
    elapsed_ms: u64,
    rate: f64,
    chunk: Chunk,
}

fn steps(records: &[ResponseRecord]) -> Vec<Step> {
    records
        .iter()
        .filter_map(|r| match &r.detail {
            RecordDetail::Adaptive {
                sequence_id,
                uploaded_size,
                elapsed_ms,
                rate,
                chunk,
            } => Some(Step {
                sequence_id: *sequence_id,
                uploaded_size: *uploaded_size,
                elapsed_ms: *elapsed_ms,
                rate: *rate,
                chunk: *chunk,
            }),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_fast_first_round_doubles_chunk_size() {
    let transport = ScriptedTransport::new(&[400], 400);
    let scheduler = AdaptiveUploadScheduler::new(transport);
    let status = scheduler.status();

    let records = scheduler.begin_session(&source(5 * MIB as usize)).await;
    let steps = steps(&records);

    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].chunk.len, 2 * MIB);
    assert_eq!(steps[0].rate, 0.5);
    assert!(steps[0].elapsed_ms >= 400);
    // next size 4 MiB, clipped to the remaining 3 MiB
    assert_eq!(steps[1].chunk.offset, 2 * MIB);
    assert_eq!(steps[1].chunk.len, 3 * MIB);
    assert_eq!(steps[1].uploaded_size, 5 * MIB);
    assert_eq!(*status.borrow(), SessionState::RequestFinished);
}

#[tokio::test(start_paused = true)]
async fn test_chunk_size_follows_clamped_latency_ratio() {
    let initial = 1000u64;
    let total = 20_000u64;
    let transport = ScriptedTransport::new(&[400, 3000, 1500, 1000, 250, 5000, 700], 1000);
    let scheduler = AdaptiveUploadScheduler::with_config(transport, &config(initial, 1000));

    let records = scheduler.begin_session(&source(total as usize)).await;
    let steps = steps(&records);
    assert!(records.iter().all(|r| r.success));

    let mut size = initial;
    let mut offset = 0u64;
    for (i, step) in steps.iter().enumerate() {
        assert_eq!(step.sequence_id, i + 1);
        assert_eq!(step.chunk.index, i);
        assert_eq!(step.chunk.offset, offset);
        assert_eq!(step.chunk.len, size.min(total - offset));
        assert!((0.5..=2.0).contains(&step.rate));

        let expected_rate = (step.elapsed_ms as f64 / 1000.0).clamp(0.5, 2.0);
        assert!((step.rate - expected_rate).abs() < 0.01);

        size = ((size as f64 / step.rate).floor() as u64).max(1);
        offset += step.chunk.len;
        assert_eq!(step.uploaded_size, offset);
    }
    assert_eq!(offset, total);

    // 400ms doubles, 3000ms halves
    assert_eq!(steps[1].chunk.len, 2000);
    assert_eq!(steps[2].chunk.len, 1000);
}

#[tokio::test(start_paused = true)]
async fn test_lengths_sum_to_source_length() {
    for latency in [50u64, 900, 1000, 4000] {
        let transport = ScriptedTransport::new(&[], latency);
        let scheduler = AdaptiveUploadScheduler::with_config(transport, &config(333, 1000));

        let records = scheduler.begin_session(&source(10_007)).await;
        let uploaded: u64 = steps(&records).iter().map(|s| s.chunk.len).sum();
        assert_eq!(uploaded, 10_007, "latency {}ms", latency);
    }
}

#[tokio::test(start_paused = true)]
async fn test_shrinking_never_stalls() {
    // Every round halves the chunk, down to one byte
    let transport = ScriptedTransport::new(&[], 5000);
    let scheduler = AdaptiveUploadScheduler::with_config(transport, &config(64, 1000));

    let records = scheduler.begin_session(&source(200)).await;
    let steps = steps(&records);

    let lens: Vec<u64> = steps.iter().take(7).map(|s| s.chunk.len).collect();
    assert_eq!(lens, vec![64, 32, 16, 8, 4, 2, 1]);
    assert_eq!(steps.iter().map(|s| s.chunk.len).sum::<u64>(), 200);
    assert!(steps[7..].iter().all(|s| s.chunk.len == 1));
}

#[tokio::test(start_paused = true)]
async fn test_strictly_sequential_with_one_sampled_fingerprint() {
    let transport = ScriptedTransport::new(&[], 300);
    let hashes = transport.hashes.clone();
    let peak = transport.peak.clone();
    let src = source(50_000);
    let scheduler = AdaptiveUploadScheduler::with_config(transport, &config(4096, 1000));

    let records = scheduler.begin_session(&src).await;
    assert!(records.len() > 1);
    assert_eq!(peak.load(Ordering::SeqCst), 1);

    let expected = sampled_fingerprint(&src, 4096).unwrap();
    assert_eq!(expected.mode(), FingerprintMode::Sampled);
    let hashes = hashes.lock().unwrap();
    assert_eq!(hashes.len(), records.len());
    assert!(hashes.iter().all(|h| h == expected.digest()));
}

#[tokio::test(start_paused = true)]
async fn test_failure_appends_one_record() {
    let mut transport = ScriptedTransport::new(&[], 1000);
    transport.reject = Some(2);
    let scheduler = AdaptiveUploadScheduler::with_config(transport, &config(100, 1000));
    let status = scheduler.status();

    let records = scheduler.begin_session(&source(1000)).await;

    assert_eq!(records.len(), 3);
    assert_eq!(steps(&records).len(), 2);

    let failure = &records[2];
    assert!(failure.is_failure());
    assert_eq!(failure.strategy, Strategy::Adaptive);
    assert!(failure.message.contains("upstream closed at chunk 2"));
    assert_eq!(
        failure.detail,
        RecordDetail::Failed {
            concurrence: None,
            error_index: Some(3)
        }
    );
    assert_eq!(*status.borrow(), SessionState::RequestFailed);
}

#[tokio::test(start_paused = true)]
async fn test_first_chunk_failure() {
    let mut transport = ScriptedTransport::new(&[], 10);
    transport.reject = Some(0);
    let scheduler = AdaptiveUploadScheduler::new(transport);

    let records = scheduler.begin_session(&source(1000)).await;

    assert_eq!(records.len(), 1);
    assert!(matches!(
        records[0].detail,
        RecordDetail::Failed {
            error_index: Some(1),
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_chunk_not_counted_as_started() {
    // Fast rounds double the size: 0..100, 100..300, then 300..700 cannot be read.
    // Sampled hashing only touches 300 through a 2-byte spot check.
    let damaged = DamagedSource {
        inner: source(1000),
        bad_from: 300,
    };
    let transport = ScriptedTransport::new(&[], 100);
    let hashes = transport.hashes.clone();
    let scheduler = AdaptiveUploadScheduler::with_config(transport, &config(100, 1000));
    let status = scheduler.status();

    let records = scheduler.begin_session(&damaged).await;

    assert_eq!(records.len(), 3);
    assert_eq!(steps(&records).len(), 2);
    assert_eq!(hashes.lock().unwrap().len(), 2);

    let failure = &records[2];
    assert!(failure.message.contains("bad sector"));
    assert_eq!(
        failure.detail,
        RecordDetail::Failed {
            concurrence: None,
            error_index: Some(2)
        }
    );
    assert_eq!(*status.borrow(), SessionState::RequestFailed);
}

#[tokio::test(start_paused = true)]
async fn test_empty_source_uploads_nothing() {
    let transport = ScriptedTransport::new(&[], 10);
    let scheduler = AdaptiveUploadScheduler::new(transport);
    let records = scheduler.begin_session(&source(0)).await;
    assert!(records.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_upload_dispatches_on_strategy() {
    let src = source(3000);

    let adaptive = upload(&config(1000, 1000), &src, ScriptedTransport::new(&[], 100)).await;
    assert!(!adaptive.is_empty());
    assert!(adaptive.iter().all(|r| r.strategy == Strategy::Adaptive));

    let batched_config = Config::new(ConfigOptions {
        chunk_size: Some(1000),
        concurrence: Some(2),
        ..Default::default()
    })
    .unwrap();
    let batched = upload(&batched_config, &src, ScriptedTransport::new(&[], 100)).await;
    assert_eq!(batched.len(), 3);
    assert!(batched.iter().all(|r| r.strategy == Strategy::Batched));
}
