//! Mock Gemini server setup for integration tests

#![allow(dead_code)]

use mockito::{Matcher, Mock, Server, ServerGuard};
use promptme::config::Config;
use serde_json::Value;

pub const MODEL: &str = "gemini-1.5-flash";
pub const API_KEY: &str = "test-key";
pub const STREAM_PATH: &str = "/v1beta/models/gemini-1.5-flash:streamGenerateContent";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: ServerGuard,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        Self {
            server: Server::new_async().await,
        }
    }

    pub fn base_url(&self) -> String {
        self.server.url()
    }

    /// Configuration pointing at this server.
    pub fn config(&self, keywords: Option<&str>, requests_per_minute: u32) -> Config {
        let keywords = keywords
            .map(|k| format!("    keywords: \"{}\"\n", k))
            .unwrap_or_default();
        let yaml = format!(
            r#"
spec:
  general:
    api_key: "{API_KEY}"
    graceful_shutdown_wait_time_sec: 1
    log_level: debug
  llm:
    provider: gemini
{keywords}    gemini:
      model: {MODEL}
      max_requests_per_minute: {requests_per_minute}
      base_url: "{}"
"#,
            self.base_url()
        );
        Config::from_yaml_str(&yaml).expect("valid test config")
    }

    /// Streaming endpoint mock, authenticated and SSE-framed.
    fn stream_mock(&mut self) -> Mock {
        self.server
            .mock("POST", STREAM_PATH)
            .match_query(Matcher::UrlEncoded("alt".into(), "sse".into()))
            .match_header("x-goog-api-key", API_KEY)
    }

    /// Successful streaming response (SSE). Call `create_async` to register it.
    pub fn sse_stream(&mut self, chunks: &[Value]) -> Mock {
        self.stream_mock()
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body(chunks))
    }

    /// Like [`sse_stream`](Self::sse_stream), only matching an exact request body.
    pub fn sse_stream_for_body(&mut self, body: Value, chunks: &[Value]) -> Mock {
        self.stream_mock()
            .match_body(Matcher::Json(body))
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(sse_body(chunks))
    }

    /// Raw SSE body, for malformed payloads.
    pub fn raw_stream(&mut self, body: &str) -> Mock {
        self.stream_mock()
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
    }

    /// Non-2xx response with a JSON error body.
    pub fn error_response(&mut self, status: usize, error_body: &str) -> Mock {
        self.stream_mock()
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(error_body)
    }

    /// Sends one chunk, then stalls long enough for the caller to give up.
    pub fn stalled_stream(&mut self, first: Value) -> Mock {
        let first = format!("data: {}\n\n", first);
        self.stream_mock()
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_chunked_body(move |w| {
                w.write_all(first.as_bytes())?;
                w.flush()?;
                std::thread::sleep(std::time::Duration::from_secs(3));
                Ok(())
            })
    }
}

/// One Gemini stream chunk carrying `text`.
pub fn text_chunk(text: &str) -> Value {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
    })
}

/// Final Gemini stream chunk.
pub fn final_chunk(text: &str) -> Value {
    serde_json::json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }], "role": "model" },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 4, "totalTokenCount": 16 }
    })
}

/// Expected request body for a prompt, optionally behind a keyword turn.
pub fn request_body(keyword_turn: Option<&str>, prompt: &str) -> Value {
    let mut contents = Vec::new();
    if let Some(turn) = keyword_turn {
        contents.push(serde_json::json!({ "role": "user", "parts": [{ "text": turn }] }));
    }
    contents.push(serde_json::json!({ "role": "user", "parts": [{ "text": prompt }] }));
    serde_json::json!({ "contents": contents })
}

fn sse_body(chunks: &[Value]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("data: {}\r\n\r\n", chunk))
        .collect()
}
