//! # Resilience Primitives Module
//!
//! Request pacing for provider calls.
//!
//! ## Rate Limiter
//!
//! [`rate_limiter::RateLimiter`] is a token bucket: its capacity is the burst size and
//! it refills continuously at the configured requests-per-minute. `admit` suspends
//! the caller until a token is available or the caller's cancellation token fires.
//!
//! ```rust
//! use promptme::resilience::rate_limiter::{RateLimiter, RateLimiterConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # tokio_test::block_on(async {
//! let limiter = RateLimiter::new(RateLimiterConfig::per_minute(15).with_burst(5));
//! let cancel = CancellationToken::new();
//! limiter.admit(&cancel).await.unwrap();
//! # });
//! ```

pub mod rate_limiter;

pub use rate_limiter::{RateLimiter, RateLimiterConfig, RateLimiterSnapshot};
