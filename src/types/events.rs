//! Streaming events decoded from a provider reply.

use serde::{Deserialize, Serialize};

/// One decoded chunk of a streamed reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum StreamingEvent {
    /// Text carried by one chunk: every part of every candidate, in order.
    #[serde(rename = "PartialContentDelta")]
    PartialContentDelta {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        sequence_id: Option<u64>,
    },

    /// Stream end
    #[serde(rename = "StreamEnd")]
    StreamEnd {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },

    /// Error object reported by the provider inside the stream
    #[serde(rename = "StreamError")]
    StreamError {
        error: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        event_id: Option<String>,
    },
}

impl StreamingEvent {
    pub fn delta(content: impl Into<String>) -> Self {
        StreamingEvent::PartialContentDelta {
            content: content.into(),
            sequence_id: None,
        }
    }
}
