//! Provider driver abstraction: each vendor's request body and stream chunk format
//! lives behind [`ProviderDriver`], so the pipeline and transport stay vendor-neutral.

pub mod gemini;

use serde_json::Value;

use crate::error::Error;
use crate::types::events::StreamingEvent;
use crate::types::message::Message;

pub use gemini::GeminiDriver;

/// Unified HTTP request representation for provider communication.
#[derive(Debug, Clone)]
pub struct DriverRequest {
    /// Path appended to the transport's base URL.
    pub path: String,
    /// Query parameters, in order.
    pub query: Vec<(String, String)>,
    /// Serialized JSON request body.
    pub body: Value,
}

/// Core trait for provider-specific API adaptation.
///
/// The trait is object-safe; the pipeline holds drivers as `Arc<dyn ProviderDriver>`.
pub trait ProviderDriver: Send + Sync + std::fmt::Debug {
    /// Unique provider identifier.
    fn provider_id(&self) -> &str;

    /// Header that carries the API key.
    fn api_key_header(&self) -> &str;

    /// Build a streaming HTTP request from a session history.
    fn build_request(&self, messages: &[Message]) -> Result<DriverRequest, Error>;

    /// Parse one decoded stream chunk into zero or more events.
    fn parse_stream_event(&self, data: &Value) -> Result<Vec<StreamingEvent>, Error>;
}
