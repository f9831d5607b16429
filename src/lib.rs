//! # promptme
//!
//! Response-generation pipeline for an interactive command-line assistant.
//!
//! ## Overview
//!
//! A prompt goes through a fixed sequence: the response cache is checked first, and on a
//! miss the configured provider is called behind a token-bucket rate limiter. The
//! provider's streamed reply is assembled into one string before it is cached and
//! returned.
//!
//! ```text
//! prompt → ResponseService ─ hit ─────────────────────────────→ text
//!                │
//!               miss → RateLimiter::admit → Provider (SSE) → Accumulator → cache → text
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use promptme::config::Config;
//! use promptme::service::{Generator, ResponseService};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> promptme::Result<()> {
//!     let config = Config::load(None)?;
//!     let generator = Generator::from_config(&config)?;
//!     let service = ResponseService::new(generator, config.llm.cache_enabled);
//!
//!     let cancel = CancellationToken::new();
//!     let response = service.respond(&cancel, "How do I prepare for an interview?").await?;
//!     println!("{} ({:?})", response.text, response.response_time());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Normalized-prompt response cache |
//! | [`resilience`] | Token-bucket rate limiting |
//! | [`drivers`] | Provider wire formats (request bodies, stream chunks) |
//! | [`transport`] | HTTP transport |
//! | [`pipeline`] | Streamed reply decoding and accumulation |
//! | [`service`] | Provider adapters, generator selection, response orchestration |
//! | [`config`] | YAML configuration loading and validation |
//! | [`types`] | Messages, streaming events, timed responses |

pub mod cache;
pub mod config;
pub mod drivers;
pub mod logging;
pub mod pipeline;
pub mod resilience;
pub mod service;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use service::{Generator, LanguageModelService, Provider, ResponseService};
pub use types::{
    events::StreamingEvent,
    message::{Message, MessageRole},
    response::Response,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A specialized Result for pipeline operations
pub type PipeResult<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `PipeResult<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = PipeResult<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
