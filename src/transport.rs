//! Transport contract - the caller-supplied delivery function

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chunk::ChunkEnvelope;

/// What the transport reports for one delivered envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: String,
}

impl TransportResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            message: message.into(),
        }
    }
}

/// Delivers one envelope. An `Err`, or a response with `success == false`,
/// ends the session.
///
/// Any `Fn(ChunkEnvelope) -> impl Future<Output = anyhow::Result<TransportResponse>>`
/// is a transport.
pub trait Transport {
    fn send(&self, envelope: ChunkEnvelope)
        -> impl Future<Output = anyhow::Result<TransportResponse>>;
}

impl<F, Fut> Transport for F
where
    F: Fn(ChunkEnvelope) -> Fut,
    Fut: Future<Output = anyhow::Result<TransportResponse>>,
{
    fn send(&self, envelope: ChunkEnvelope) -> impl Future<Output = anyhow::Result<TransportResponse>> {
        self(envelope)
    }
}
