//! # Response Generation Services
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`LanguageModelService`] | Capability trait: prompt in, full reply text out |
//! | [`GeminiService`] | Gemini backend behind a token-bucket rate limiter |
//! | [`Generator`] | Closed set of backends, selected from configuration |
//! | [`ResponseService`] | Cache-first orchestration over any backend |

pub mod gemini;
pub mod response;
pub mod selector;

use crate::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use gemini::GeminiService;
pub use response::ResponseService;
pub use selector::{Generator, Provider};

/// A language-model backend.
///
/// Implementations must return the complete reply text only when the whole stream
/// was consumed without error, and must give up promptly with
/// [`Error::Cancelled`](crate::Error::Cancelled) once `cancel` fires.
#[async_trait]
pub trait LanguageModelService: Send + Sync {
    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String>;

    fn provider_id(&self) -> &str;
}
