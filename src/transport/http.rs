use crate::drivers::DriverRequest;
use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::StreamExt;
use reqwest::Proxy;
use std::env;
use std::time::Duration;
use url::Url;

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    /// Longest gap allowed between response bytes, including the wait for headers.
    idle_timeout: Duration,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| {
            Error::configuration("spec.llm.gemini.base_url", format!("invalid URL: {}", e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::configuration(
                "spec.llm.gemini.base_url",
                format!("unsupported scheme: {}", parsed.scheme()),
            ));
        }

        // Minimal production-friendly defaults (env-overridable). There is no total
        // request timeout; streamed bodies are bounded by the idle timeout only.
        let connect_timeout_secs = env_parse("PROMPTME_HTTP_CONNECT_TIMEOUT_SECS").unwrap_or(10);
        let idle_timeout_secs = env_parse("PROMPTME_HTTP_IDLE_TIMEOUT_SECS").unwrap_or(60);

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .pool_max_idle_per_host(env_parse("PROMPTME_HTTP_POOL_MAX_IDLE_PER_HOST").unwrap_or(8))
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Ok(proxy_url) = env::var("PROMPTME_PROXY_URL") {
            match Proxy::all(&proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!(error = %e, "ignoring invalid PROMPTME_PROXY_URL"),
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            idle_timeout: Duration::from_secs(idle_timeout_secs),
        })
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send `request` and hand back the reply body as a byte stream.
    ///
    /// Non-2xx replies are read in full and returned as [`Error::Remote`]. If the
    /// server goes quiet for longer than the idle timeout, the stream ends with
    /// [`TransportError::Idle`].
    pub async fn execute_stream(
        &self,
        request: &DriverRequest,
        api_key_header: &str,
    ) -> Result<BoxStream<'static, Bytes>> {
        let url = format!("{}{}", self.base_url, request.path);

        let req = self
            .client
            .post(&url)
            .query(&request.query)
            .header(api_key_header, &self.api_key)
            .header("accept", "text/event-stream")
            .json(&request.body);

        tracing::debug!(url = %url, "sending provider request");
        let idle = self.idle_timeout;
        let resp = tokio::time::timeout(idle, req.send())
            .await
            .map_err(|_| Error::Transport(TransportError::Idle(idle)))?
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            tracing::warn!(status = status.as_u16(), message = %message, "provider rejected request");
            return Err(Error::Remote {
                status: status.as_u16(),
                message,
            });
        }

        let body = Box::pin(resp.bytes_stream());
        let byte_stream = futures::stream::unfold(Some(body), move |body| async move {
            let mut body = body?;
            match tokio::time::timeout(idle, body.next()).await {
                Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(body))),
                Ok(Some(Err(e))) => Some((Err(Error::Transport(TransportError::Http(e))), None)),
                Ok(None) => None,
                Err(_) => {
                    tracing::warn!(idle_ms = idle.as_millis() as u64, "provider stream stalled");
                    Some((Err(Error::Transport(TransportError::Idle(idle))), None))
                }
            }
        });
        Ok(Box::pin(byte_stream))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}

/// Pull `error.message` out of a provider error body, falling back to the raw text.
fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parsed = serde_json::from_str::<serde_json::Value>(trimmed).ok();
    // Gemini wraps streamed errors in a one-element array.
    let error = parsed.as_ref().and_then(|v| match v {
        serde_json::Value::Array(items) => items.first().and_then(|i| i.get("error")),
        other => other.get("error"),
    });
    match error.and_then(|e| e.get("message")).and_then(|m| m.as_str()) {
        Some(message) => Some(message.to_string()),
        None => Some(trimmed.to_string()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no data received for {0:?}")]
    Idle(Duration),

    #[error("Transport error: {0}")]
    Other(String),
}
