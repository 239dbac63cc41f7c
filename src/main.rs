//! tcpss-upload - run an upload session over a local file against a simulated transport

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use tcpss_upload::config::{Config, ConfigOptions, Strategy};
use tcpss_upload::{upload, ChunkEnvelope, FileSource, Transport, TransportResponse};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(ValueEnum, Debug, Copy, Clone)]
enum StrategyArg {
    Batched,
    Adaptive,
}

#[derive(Parser, Debug)]
#[command(name = "tcpss-upload")]
#[command(about = "Chunked upload with batched or slow-start adaptive scheduling")]
struct Args {
    /// File to upload
    path: PathBuf,

    /// Scheduling strategy: batched, adaptive
    #[arg(long, value_enum, default_value = "batched")]
    strategy: StrategyArg,

    /// Concurrent calls per window (batched)
    #[arg(long)]
    concurrence: Option<usize>,

    /// Chunk size in bytes (batched: fixed, adaptive: initial)
    #[arg(long)]
    chunk_size: Option<u64>,

    /// Slow-start threshold in milliseconds (adaptive)
    #[arg(long)]
    ssthresh_ms: Option<u64>,

    /// Compute the fingerprint only, skip batched delivery
    #[arg(long)]
    no_async: bool,

    /// Simulated fixed latency per call in milliseconds
    #[arg(long, default_value_t = 100)]
    latency_ms: u64,

    /// Simulated link speed in KiB/s, adds transfer time proportional to chunk size
    #[arg(long)]
    bandwidth_kib: Option<u64>,

    /// Reject the chunk with this index
    #[arg(long)]
    fail_at: Option<usize>,
}

/// Sleeps for a latency + size/bandwidth delay, then echoes the envelope metadata
struct SimulatedTransport {
    latency: Duration,
    bandwidth_kib: Option<u64>,
    fail_at: Option<usize>,
}

impl Transport for SimulatedTransport {
    async fn send(&self, envelope: ChunkEnvelope) -> Result<TransportResponse> {
        let transfer = match self.bandwidth_kib {
            Some(kib) if kib > 0 => {
                Duration::from_secs_f64(envelope.data.len() as f64 / (kib as f64 * 1024.0))
            }
            _ => Duration::ZERO,
        };
        tokio::time::sleep(self.latency + transfer).await;

        if self.fail_at == Some(envelope.chunk.index) {
            return Err(anyhow!("simulated rejection of chunk {}", envelope.chunk.index));
        }
        Ok(TransportResponse::ok(serde_json::to_value(envelope.metadata())?))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, records to stdout
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = Config::new(ConfigOptions {
        strategy: Some(match args.strategy {
            StrategyArg::Batched => Strategy::Batched,
            StrategyArg::Adaptive => Strategy::Adaptive,
        }),
        concurrence: args.concurrence,
        chunk_size: args.chunk_size,
        slow_start_threshold_ms: args.ssthresh_ms,
        hash_slice_ms: None,
        disable_async: args.no_async,
    })?;

    let source = FileSource::open(&args.path)?;
    info!("Starting {:?} upload of {:?}", config.strategy, source.path());

    let transport = SimulatedTransport {
        latency: Duration::from_millis(args.latency_ms),
        bandwidth_kib: args.bandwidth_kib,
        fail_at: args.fail_at,
    };

    let records = upload(&config, &source, transport).await;
    println!("{}", serde_json::to_string_pretty(&records)?);

    if let Some(failure) = records.iter().find(|r| r.is_failure()) {
        error!("Upload failed: {}", failure.message);
        std::process::exit(1);
    }

    Ok(())
}
