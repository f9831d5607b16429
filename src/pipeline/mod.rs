//! # Streaming Pipeline
//!
//! Turns the raw byte stream of a provider reply into unified [`StreamingEvent`]s, and
//! folds those events into the final response text.
//!
//! ## Pipeline Stages
//!
//! ```text
//! Raw Bytes → Decoder → Event Mapper → Events → Accumulator → String
//!     │           │           │                      │
//!   HTTP        SSE      ProviderDriver         concatenate deltas,
//!              frames    chunk parsing          abort on first error
//! ```
//!
//! The stream is lazy, finite and cannot be restarted; the accumulator consumes it
//! to completion before anything is returned to the caller.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Pipeline`] | Decoder + mapper for one provider |
//! | [`PipelineBuilder`] | Builder for constructing pipelines |
//! | [`Decoder`] | Trait for byte-stream decoding |
//! | [`Mapper`] | Trait for mapping decoded frames to events |
//! | [`accumulate::Accumulator`] | Folds events into the response text |

pub mod accumulate;
pub mod decode;
pub mod event_map;

use crate::drivers::ProviderDriver;
use crate::types::events::StreamingEvent;
use crate::{BoxStream, PipeResult};
use std::sync::Arc;

/// Specialized mapper for the final stage of the pipeline
#[async_trait::async_trait]
pub trait Mapper: Send + Sync {
    /// A mapper takes a stream of JSON values and returns a stream of unified events
    async fn map(
        &self,
        input: BoxStream<'static, serde_json::Value>,
    ) -> PipeResult<BoxStream<'static, StreamingEvent>>;
}

/// Decoder trait for stream decoding
#[async_trait::async_trait]
pub trait Decoder: Send + Sync {
    /// Decode a byte stream into JSON values
    async fn decode_stream(
        &self,
        input: BoxStream<'static, bytes::Bytes>,
    ) -> PipeResult<BoxStream<'static, serde_json::Value>>;
}

/// Pipeline error types
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Decoder error: {0}")]
    Decoder(String),

    #[error("Event mapper error: {0}")]
    EventMapper(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider reported an error inside the stream.
    #[error("Provider stream error{}: {message}", .status.as_ref().map(|s| format!(" ({})", s)).unwrap_or_default())]
    StreamError {
        code: Option<i64>,
        status: Option<String>,
        message: String,
    },
}

impl PipelineError {
    /// Build a [`PipelineError::StreamError`] from a provider error object
    /// such as `{"code": 500, "status": "INTERNAL", "message": "..."}`.
    pub fn from_stream_error(error: &serde_json::Value) -> Self {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        PipelineError::StreamError {
            code: error.get("code").and_then(|c| c.as_i64()),
            status: error
                .get("status")
                .and_then(|s| s.as_str())
                .map(String::from),
            message,
        }
    }
}

/// Pipeline builder
pub struct PipelineBuilder {
    decoder: Option<Box<dyn Decoder>>,
    mapper: Option<Box<dyn Mapper>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            decoder: None,
            mapper: None,
        }
    }

    pub fn set_decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn set_mapper(mut self, mapper: Box<dyn Mapper>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn build(self) -> Result<Pipeline, PipelineError> {
        Ok(Pipeline {
            decoder: self
                .decoder
                .ok_or_else(|| PipelineError::Configuration("Decoder is required".to_string()))?,
            mapper: self.mapper.ok_or_else(|| {
                PipelineError::Configuration("Event mapper is required".to_string())
            })?,
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Pipeline that processes streaming responses
pub struct Pipeline {
    decoder: Box<dyn Decoder>,
    mapper: Box<dyn Mapper>,
}

impl Pipeline {
    /// SSE framing with the driver's chunk parser.
    pub fn for_driver(driver: Arc<dyn ProviderDriver>) -> Result<Self, PipelineError> {
        PipelineBuilder::new()
            .set_decoder(Box::new(decode::SseDecoder::default()))
            .set_mapper(Box::new(event_map::DriverEventMapper::new(driver)))
            .build()
    }

    /// Process a byte stream through the pipeline
    pub async fn process_stream(
        &self,
        input: BoxStream<'static, bytes::Bytes>,
    ) -> PipeResult<BoxStream<'static, StreamingEvent>> {
        let frames = self.decoder.decode_stream(input).await?;
        self.mapper.map(frames).await
    }
}
