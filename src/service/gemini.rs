use crate::config::Config;
use crate::drivers::{DriverRequest, GeminiDriver, ProviderDriver};
use crate::pipeline::accumulate::Accumulator;
use crate::pipeline::Pipeline;
use crate::resilience::{RateLimiter, RateLimiterConfig};
use crate::service::LanguageModelService;
use crate::transport::HttpTransport;
use crate::types::message::Message;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Context turn that restricts replies to the configured topics.
pub fn keyword_context(keywords: &str) -> String {
    format!(
        "only return response that are related to {} and the likes",
        keywords
    )
}

/// Gemini backend.
///
/// Every call opens a fresh, stateless chat session: the optional keyword turn
/// followed by the prompt. Calls share one rate limiter.
pub struct GeminiService {
    driver: Arc<GeminiDriver>,
    transport: HttpTransport,
    pipeline: Pipeline,
    limiter: Arc<RateLimiter>,
    keywords: Option<String>,
}

impl std::fmt::Debug for GeminiService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiService")
            .field("model", &self.driver.model())
            .field("transport", &self.transport)
            .field("keywords", &self.keywords)
            .finish()
    }
}

impl GeminiService {
    pub fn new(
        driver: GeminiDriver,
        transport: HttpTransport,
        limiter: Arc<RateLimiter>,
        keywords: Option<String>,
    ) -> Result<Self> {
        let driver = Arc::new(driver);
        let pipeline = Pipeline::for_driver(driver.clone())?;
        Ok(Self {
            driver,
            transport,
            pipeline,
            limiter,
            keywords: keywords.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let gemini = &config.llm.gemini;
        let transport = HttpTransport::new(&gemini.base_url, config.general.api_key.clone())?;

        let mut limits = RateLimiterConfig::per_minute(gemini.max_requests_per_minute);
        if let Some(burst) = gemini.burst {
            limits = limits.with_burst(burst);
        }
        info!(
            model = %gemini.model,
            requests_per_minute = gemini.max_requests_per_minute,
            burst = limits.burst,
            "gemini service configured"
        );

        Self::new(
            GeminiDriver::new(gemini.model.clone()),
            transport,
            Arc::new(RateLimiter::new(limits)),
            config.keywords().map(String::from),
        )
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Turns sent for `prompt`.
    pub fn session_history(&self, prompt: &str) -> Vec<Message> {
        let mut history = Vec::with_capacity(2);
        match &self.keywords {
            Some(keywords) => {
                info!(keywords = %keywords, "keyword restriction on");
                history.push(Message::user(keyword_context(keywords)));
            }
            None => info!("keyword restriction off"),
        }
        history.push(Message::user(prompt));
        history
    }

    async fn stream_reply(&self, request: &DriverRequest) -> Result<String> {
        let started = Instant::now();
        let bytes = self
            .transport
            .execute_stream(request, self.driver.api_key_header())
            .await?;
        let events = self.pipeline.process_stream(bytes).await?;
        let result = Accumulator::collect(events).await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(text) => info!(
                provider = self.driver.provider_id(),
                elapsed_ms,
                bytes = text.len(),
                "provider call completed"
            ),
            Err(e) => warn!(
                provider = self.driver.provider_id(),
                elapsed_ms,
                error = %e,
                "provider call failed"
            ),
        }
        result
    }
}

#[async_trait]
impl LanguageModelService for GeminiService {
    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String> {
        self.limiter.admit(cancel).await?;

        let history = self.session_history(prompt);
        let request = self.driver.build_request(&history)?;
        debug!(turns = history.len(), path = %request.path, "chat session opened");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("provider call cancelled");
                Err(Error::Cancelled)
            }
            result = self.stream_reply(&request) => result,
        }
    }

    fn provider_id(&self) -> &str {
        self.driver.provider_id()
    }
}
