//! Google Gemini generateContent API driver. Key differences from chat-style APIs:
//! - Uses `contents` instead of `messages`, with `parts` instead of `content`.
//! - Roles: `user` and `model` (not `assistant`).
//! - Streaming goes through `:streamGenerateContent?alt=sse`; every SSE frame is a
//!   full generateContent response carrying the next slice of text.
//! - API key is passed in the `x-goog-api-key` header.

use serde_json::Value;

use crate::error::Error;
use crate::pipeline::PipelineError;
use crate::types::events::StreamingEvent;
use crate::types::message::Message;

use super::{DriverRequest, ProviderDriver};

/// Google Gemini generateContent API driver.
#[derive(Debug, Clone)]
pub struct GeminiDriver {
    model: String,
}

impl GeminiDriver {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert session turns to Gemini `contents`.
    fn contents(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "parts": [{ "text": m.content }],
                })
            })
            .collect()
    }

    /// Text of every part of every candidate, in order.
    fn chunk_text(chunk: &Value) -> String {
        let mut text = String::new();
        let Some(candidates) = chunk.get("candidates").and_then(|c| c.as_array()) else {
            return text;
        };
        for candidate in candidates {
            let parts = candidate
                .pointer("/content/parts")
                .and_then(|p| p.as_array())
                .map(Vec::as_slice)
                .unwrap_or_default();
            for part in parts {
                if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
                    text.push_str(t);
                }
            }
        }
        text
    }

    fn finish_reason(chunk: &Value) -> Option<String> {
        chunk
            .get("candidates")?
            .as_array()?
            .iter()
            .find_map(|c| c.get("finishReason").and_then(|r| r.as_str()))
            .map(normalize_finish_reason)
    }
}

/// Gemini finish reasons mapped onto the lowercase names used by [`StreamingEvent::StreamEnd`].
pub fn normalize_finish_reason(reason: &str) -> String {
    match reason {
        "STOP" => "stop".to_string(),
        "MAX_TOKENS" => "length".to_string(),
        "SAFETY" | "RECITATION" => "content_filter".to_string(),
        other => other.to_lowercase(),
    }
}

impl ProviderDriver for GeminiDriver {
    fn provider_id(&self) -> &str {
        "gemini"
    }

    fn api_key_header(&self) -> &str {
        "x-goog-api-key"
    }

    fn build_request(&self, messages: &[Message]) -> Result<DriverRequest, Error> {
        if messages.is_empty() {
            return Err(Error::Pipeline(PipelineError::Configuration(
                "chat session has no turns".to_string(),
            )));
        }

        let body = serde_json::json!({
            "contents": Self::contents(messages),
        });

        Ok(DriverRequest {
            path: format!("/v1beta/models/{}:streamGenerateContent", self.model),
            query: vec![("alt".to_string(), "sse".to_string())],
            body,
        })
    }

    fn parse_stream_event(&self, data: &Value) -> Result<Vec<StreamingEvent>, Error> {
        if !data.is_object() {
            return Err(Error::Pipeline(PipelineError::EventMapper(format!(
                "unexpected Gemini chunk: {}",
                data
            ))));
        }

        if let Some(error) = data.get("error") {
            return Ok(vec![StreamingEvent::StreamError {
                error: error.clone(),
                event_id: None,
            }]);
        }

        let mut events = Vec::new();
        let text = Self::chunk_text(data);
        if !text.is_empty() {
            events.push(StreamingEvent::delta(text));
        }
        if let Some(reason) = Self::finish_reason(data) {
            events.push(StreamingEvent::StreamEnd {
                finish_reason: Some(reason),
            });
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gemini_role_mapping() {
        let msgs = vec![
            Message::user("only return response that are related to careers and the likes"),
            Message::model("Understood."),
            Message::user("How do I negotiate salary?"),
        ];
        let req = GeminiDriver::new("gemini-1.5-flash")
            .build_request(&msgs)
            .unwrap();
        let contents = req.body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "How do I negotiate salary?");
    }

    #[test]
    fn test_gemini_stream_request_path() {
        let req = GeminiDriver::new("gemini-1.5-flash")
            .build_request(&[Message::user("Hello")])
            .unwrap();
        assert_eq!(req.path, "/v1beta/models/gemini-1.5-flash:streamGenerateContent");
        assert_eq!(req.query, vec![("alt".to_string(), "sse".to_string())]);
        assert_eq!(req.body["contents"][0]["parts"][0]["text"], "Hello");
    }

    #[test]
    fn test_gemini_rejects_empty_session() {
        let err = GeminiDriver::new("m").build_request(&[]).unwrap_err();
        assert!(matches!(err, Error::Pipeline(PipelineError::Configuration(_))));
    }

    #[test]
    fn test_gemini_parse_stream_delta() {
        let driver = GeminiDriver::new("gemini-1.5-flash");
        let data = json!({"candidates":[{"content":{"parts":[{"text":"World"}],"role":"model"}}]});
        let events = driver.parse_stream_event(&data).unwrap();
        assert_eq!(events, vec![StreamingEvent::delta("World")]);
    }

    #[test]
    fn test_gemini_concatenates_all_parts_and_candidates() {
        let driver = GeminiDriver::new("gemini-1.5-flash");
        let data = json!({"candidates":[
            {"content":{"parts":[{"text":"a"},{"text":"b"}]}},
            {"content":{"parts":[{"text":"c"}]}}
        ]});
        let events = driver.parse_stream_event(&data).unwrap();
        assert_eq!(events, vec![StreamingEvent::delta("abc")]);
    }

    #[test]
    fn test_gemini_text_with_finish_reason() {
        let driver = GeminiDriver::new("gemini-1.5-flash");
        let data = json!({"candidates":[{"content":{"parts":[{"text":"!"}]},"finishReason":"SAFETY"}]});
        let events = driver.parse_stream_event(&data).unwrap();
        assert_eq!(
            events,
            vec![
                StreamingEvent::delta("!"),
                StreamingEvent::StreamEnd {
                    finish_reason: Some("content_filter".into())
                }
            ]
        );
    }

    #[test]
    fn test_gemini_usage_only_chunk_is_empty() {
        let driver = GeminiDriver::new("gemini-1.5-flash");
        let data = json!({"usageMetadata": {"totalTokenCount": 8}});
        assert!(driver.parse_stream_event(&data).unwrap().is_empty());
    }

    #[test]
    fn test_gemini_error_object() {
        let driver = GeminiDriver::new("gemini-1.5-flash");
        let data = json!({"error": {"code": 429, "status": "RESOURCE_EXHAUSTED", "message": "quota"}});
        let events = driver.parse_stream_event(&data).unwrap();
        assert!(matches!(&events[0], StreamingEvent::StreamError { error, .. } if error["code"] == 429));
    }

    #[test]
    fn test_gemini_non_object_chunk_is_an_error() {
        let driver = GeminiDriver::new("gemini-1.5-flash");
        let err = driver.parse_stream_event(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, Error::Pipeline(PipelineError::EventMapper(_))));
    }

    #[test]
    fn test_finish_reason_normalization() {
        assert_eq!(normalize_finish_reason("STOP"), "stop");
        assert_eq!(normalize_finish_reason("MAX_TOKENS"), "length");
        assert_eq!(normalize_finish_reason("RECITATION"), "content_filter");
        assert_eq!(normalize_finish_reason("OTHER"), "other");
    }
}
