use crate::{Error, Result};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct RateLimiterSnapshot {
    pub requests_per_minute: f64,
    pub burst: f64,
    pub tokens: f64,
    /// Estimated wait time until a token is available (ms), if currently empty.
    pub estimated_wait_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Tokens per second.
    pub rps: f64,
    /// Maximum burst size (tokens).
    pub burst: f64,
}

impl RateLimiterConfig {
    /// `rpm` requests per minute, refilled continuously; burst defaults to `rpm`.
    ///
    /// Zero disables limiting.
    pub fn per_minute(rpm: u32) -> Self {
        Self {
            rps: f64::from(rpm) / 60.0,
            burst: f64::from(rpm.max(1)),
        }
    }

    /// Set the maximum burst size (at least one token).
    pub fn with_burst(mut self, burst: u32) -> Self {
        self.burst = f64::from(burst.max(1));
        self
    }

    pub fn requests_per_minute(&self) -> f64 {
        self.rps * 60.0
    }
}

#[derive(Debug)]
struct State {
    tokens: f64,
    last: Instant,
}

/// Token-bucket gate in front of provider calls.
///
/// Shared by every request issued through one generator. Waiters are not
/// queued: each one re-checks the bucket after the refill delay it computed.
pub struct RateLimiter {
    cfg: RateLimiterConfig,
    state: Mutex<State>,
}

impl RateLimiter {
    pub fn new(cfg: RateLimiterConfig) -> Self {
        let burst = cfg.burst;
        let state = Mutex::new(State {
            tokens: burst,
            last: Instant::now(),
        });
        Self { cfg, state }
    }

    fn refill_locked(cfg: &RateLimiterConfig, st: &mut State) {
        let now = Instant::now();
        let elapsed = now.duration_since(st.last).as_secs_f64();
        if elapsed > 0.0 {
            st.tokens = (st.tokens + elapsed * cfg.rps).min(cfg.burst);
            st.last = now;
        }
    }

    /// Wait for one token, or until `cancel` fires.
    ///
    /// A cancelled wait returns [`Error::Cancelled`] and leaves the bucket untouched.
    pub async fn admit(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let cfg = &self.cfg;
        loop {
            let wait_duration = {
                let mut st = self.state.lock().await;
                if cfg.rps <= 0.0 {
                    return Ok(());
                }

                Self::refill_locked(cfg, &mut st);

                if st.tokens >= 1.0 {
                    st.tokens -= 1.0;
                    tracing::debug!(tokens_left = st.tokens, "ratelimiter admitted request");
                    return Ok(());
                }

                let missing = 1.0 - st.tokens;
                let snapshot = Self::snapshot_locked(cfg, &st);
                tracing::info!(
                    requests_per_minute = snapshot.requests_per_minute,
                    burst = snapshot.burst,
                    tokens = snapshot.tokens,
                    wait_ms = snapshot.estimated_wait_ms,
                    "ratelimiter waiting for a token"
                );
                Duration::from_secs_f64(missing / cfg.rps)
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("ratelimiter wait cancelled");
                    return Err(Error::Cancelled);
                }
                _ = tokio::time::sleep(wait_duration) => {}
            }
        }
    }

    /// Try to take a token without waiting, returns true if successful
    pub async fn try_admit(&self) -> bool {
        let cfg = &self.cfg;
        if cfg.rps <= 0.0 {
            return true;
        }

        let mut st = self.state.lock().await;
        Self::refill_locked(cfg, &mut st);

        if st.tokens >= 1.0 {
            st.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    pub async fn snapshot(&self) -> RateLimiterSnapshot {
        let cfg = &self.cfg;
        let mut st = self.state.lock().await;
        if cfg.rps > 0.0 {
            Self::refill_locked(cfg, &mut st);
        }
        Self::snapshot_locked(cfg, &st)
    }

    fn snapshot_locked(cfg: &RateLimiterConfig, st: &State) -> RateLimiterSnapshot {
        let estimated_wait_ms = (cfg.rps > 0.0 && st.tokens < 1.0)
            .then(|| ((1.0 - st.tokens) / cfg.rps * 1000.0).ceil() as u64);

        RateLimiterSnapshot {
            requests_per_minute: cfg.requests_per_minute(),
            burst: cfg.burst,
            tokens: st.tokens,
            estimated_wait_ms,
        }
    }
}
