use crate::cache::{CacheManager, CacheStats};
use crate::service::{Generator, LanguageModelService};
use crate::types::response::Response;
use crate::Result;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Cache-first response generation.
///
/// A hit returns immediately without touching the rate limiter or the provider.
/// Only successful replies are cached, under the normalized prompt. Concurrent
/// misses for the same prompt each call the provider; the last write wins.
pub struct ResponseService<G = Generator> {
    generator: G,
    cache: CacheManager,
}

impl<G: LanguageModelService> ResponseService<G> {
    pub fn new(generator: G, cache_enabled: bool) -> Self {
        Self::with_cache(generator, CacheManager::with_enabled(cache_enabled))
    }

    pub fn with_cache(generator: G, cache: CacheManager) -> Self {
        debug!(
            provider = generator.provider_id(),
            cache = cache.backend_name(),
            "response service ready"
        );
        Self { generator, cache }
    }

    pub async fn generate_response(
        &self,
        cancel: &CancellationToken,
        prompt: &str,
    ) -> Result<String> {
        if let Some(text) = self.cache.get(prompt) {
            info!("response served from cache");
            return Ok(text);
        }

        match self.generator.generate(cancel, prompt).await {
            Ok(text) => {
                self.cache.set(prompt, text.clone());
                debug!(cached_entries = self.cache.len(), "response cached");
                Ok(text)
            }
            Err(e) => {
                warn!(error = %e, "response generation failed");
                Err(e)
            }
        }
    }

    /// [`generate_response`](Self::generate_response) with wall-clock timing.
    pub async fn respond(&self, cancel: &CancellationToken, prompt: &str) -> Result<Response> {
        let start_time = Instant::now();
        let text = self.generate_response(cancel, prompt).await?;
        let response = Response::new(text, start_time, Instant::now());
        info!(
            response_time_ms = response.response_time().as_millis() as u64,
            "response ready"
        );
        Ok(response)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingModel {
        calls: AtomicUsize,
        fail: bool,
        /// Holds every call until this many are in flight.
        gate: Option<tokio::sync::Barrier>,
    }

    #[async_trait]
    impl LanguageModelService for CountingModel {
        async fn generate(&self, _cancel: &CancellationToken, prompt: &str) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(gate) = &self.gate {
                gate.wait().await;
            }
            if self.fail {
                return Err(Error::Remote {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            Ok(format!("reply #{n} to {prompt}"))
        }

        fn provider_id(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_variants_hit_cache_after_first_call() {
        let service = ResponseService::new(CountingModel::default(), true);
        let cancel = CancellationToken::new();

        let first = service
            .generate_response(&cancel, "How do I write a CV?")
            .await
            .unwrap();
        for variant in ["how do i write a cv?", "  HOW DO I WRITE A CV?\n", "How do I write a CV?"] {
            assert_eq!(service.generate_response(&cancel, variant).await.unwrap(), first);
        }

        assert_eq!(service.generator().calls.load(Ordering::SeqCst), 1);
        let stats = service.cache_stats();
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let service = ResponseService::new(
            CountingModel {
                fail: true,
                ..Default::default()
            },
            true,
        );
        let cancel = CancellationToken::new();

        for _ in 0..2 {
            let err = service.generate_response(&cancel, "prompt").await.unwrap_err();
            assert!(matches!(err, Error::Remote { status: 503, .. }));
        }
        assert_eq!(service.generator().calls.load(Ordering::SeqCst), 2);
        assert_eq!(service.cache_stats().sets, 0);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_calls_backend() {
        let service = ResponseService::new(CountingModel::default(), false);
        let cancel = CancellationToken::new();
        service.generate_response(&cancel, "a").await.unwrap();
        service.generate_response(&cancel, "a").await.unwrap();
        assert_eq!(service.generator().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_service() {
        let service = Arc::new(ResponseService::new(CountingModel::default(), true));
        let cancel = CancellationToken::new();
        service.generate_response(&cancel, "warm").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                service.generate_response(&cancel, "WARM").await.unwrap()
            }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap(), "reply #1 to warm");
        }
        assert_eq!(service.generator().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_misses_both_reach_backend() {
        let service = Arc::new(ResponseService::new(
            CountingModel {
                gate: Some(tokio::sync::Barrier::new(2)),
                ..Default::default()
            },
            true,
        ));
        let cancel = CancellationToken::new();

        let handles: Vec<_> = ["Negotiate salary?", "negotiate salary?"]
            .into_iter()
            .map(|prompt| {
                let service = Arc::clone(&service);
                let cancel = cancel.clone();
                tokio::spawn(async move { service.generate_response(&cancel, prompt).await })
            })
            .collect();
        let mut replies = Vec::new();
        for h in handles {
            replies.push(h.await.unwrap().unwrap());
        }

        assert_eq!(service.generator().calls.load(Ordering::SeqCst), 2);
        let stats = service.cache_stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.sets, 2);

        // One of the two writes is kept and later lookups hit it.
        let cached = service
            .generate_response(&cancel, "NEGOTIATE SALARY?")
            .await
            .unwrap();
        assert!(replies.contains(&cached));
        assert_eq!(service.generator().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_respond_records_timing() {
        let service = ResponseService::new(CountingModel::default(), true);
        let response = service
            .respond(&CancellationToken::new(), "hello")
            .await
            .unwrap();
        assert_eq!(response.text, "reply #1 to hello");
        assert!(response.end_time >= response.start_time);
        assert_eq!(response.response_time(), response.end_time - response.start_time);
    }
}
