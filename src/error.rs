use crate::pipeline::PipelineError;
use thiserror::Error;

/// Structured error context for configuration and construction failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key that caused the error (e.g., "spec.llm.gemini.model")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "generator_selector")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the response-generation pipeline.
///
/// Cache operations never fail and have no variant here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("unsupported language model provider: {0}")]
    UnsupportedProvider(String),

    /// The caller's cancellation token fired while waiting for admission or
    /// while the provider call was in flight.
    #[error("request cancelled")]
    Cancelled,

    #[error("Stream processing error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("Remote error: HTTP {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a configuration error pointing at a single config key
    pub fn configuration(field_path: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::configuration_with_context(
            msg,
            ErrorContext::new()
                .with_field_path(field_path)
                .with_source("config_loader"),
        )
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Whether the caller may reasonably try the same prompt again.
    ///
    /// Construction errors are never retryable; cancellation, transport failures
    /// and 429/5xx responses are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Cancelled | Error::Transport(_) => true,
            Error::Remote { status, .. } => *status == 429 || *status >= 500,
            Error::Configuration { .. }
            | Error::UnsupportedProvider(_)
            | Error::Pipeline(_)
            | Error::Io(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display_includes_field() {
        let err = Error::configuration("spec.llm.gemini.model", "must not be empty");
        let msg = err.to_string();
        assert!(msg.contains("must not be empty"));
        assert!(msg.contains("field: spec.llm.gemini.model"));
        assert!(msg.contains("source: config_loader"));
        assert!(err.context().is_some());
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Cancelled.is_retryable());
        assert!(Error::Remote { status: 429, message: "slow down".into() }.is_retryable());
        assert!(Error::Remote { status: 503, message: "unavailable".into() }.is_retryable());
        assert!(!Error::Remote { status: 400, message: "bad".into() }.is_retryable());
        assert!(!Error::UnsupportedProvider("unknown".into()).is_retryable());
        assert!(!Error::configuration("spec.general.api_key", "missing").is_retryable());
    }

    #[test]
    fn test_unsupported_provider_message() {
        let err = Error::UnsupportedProvider("unknown".into());
        assert_eq!(
            err.to_string(),
            "unsupported language model provider: unknown"
        );
    }
}
