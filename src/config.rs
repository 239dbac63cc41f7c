//! Configuration module - upload options and validated settings

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, UploadError};

/// Default chunk size (2 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 2 * 1024 * 1024;
/// Default batched fan-out width
pub const DEFAULT_CONCURRENCE: usize = 4;
/// Default slow-start threshold in milliseconds
pub const DEFAULT_SLOW_START_THRESHOLD_MS: u64 = 1000;
/// Default idle slice granted to exhaustive hashing between yields
pub const DEFAULT_HASH_SLICE_MS: u64 = 16;

/// Delivery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Fixed-width windows of concurrent transport calls
    #[default]
    Batched,
    /// One call at a time, chunk size driven by observed latency
    Adaptive,
}

/// Optional configuration parameters for Config::new()
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub strategy: Option<Strategy>,
    pub concurrence: Option<usize>,
    pub chunk_size: Option<u64>,
    pub slow_start_threshold_ms: Option<u64>,
    pub hash_slice_ms: Option<u64>,
    /// Compute the fingerprint but skip batched delivery entirely
    pub disable_async: bool,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub strategy: Strategy,
    pub concurrence: usize,
    pub async_mode: bool,
    pub chunk_size: u64,
    pub slow_start_threshold: Duration,
    pub hash_slice: Duration,
}

impl Config {
    /// Create a new Config, rejecting values no session could run with
    pub fn new(options: ConfigOptions) -> Result<Arc<Self>> {
        let concurrence = options.concurrence.unwrap_or(DEFAULT_CONCURRENCE);
        if concurrence == 0 {
            return Err(UploadError::Configuration(
                "concurrence must be at least 1".to_string(),
            ));
        }

        let chunk_size = options.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 {
            return Err(UploadError::Configuration(
                "chunk_size must be at least 1 byte".to_string(),
            ));
        }

        let threshold_ms = options
            .slow_start_threshold_ms
            .unwrap_or(DEFAULT_SLOW_START_THRESHOLD_MS);
        if threshold_ms == 0 {
            return Err(UploadError::Configuration(
                "slow_start_threshold_ms must be positive".to_string(),
            ));
        }

        Ok(Arc::new(Self {
            strategy: options.strategy.unwrap_or_default(),
            concurrence,
            async_mode: !options.disable_async,
            chunk_size,
            slow_start_threshold: Duration::from_millis(threshold_ms),
            hash_slice: Duration::from_millis(
                options.hash_slice_ms.unwrap_or(DEFAULT_HASH_SLICE_MS),
            ),
        }))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            concurrence: DEFAULT_CONCURRENCE,
            async_mode: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            slow_start_threshold: Duration::from_millis(DEFAULT_SLOW_START_THRESHOLD_MS),
            hash_slice: Duration::from_millis(DEFAULT_HASH_SLICE_MS),
        }
    }
}
