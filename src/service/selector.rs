use crate::config::Config;
use crate::service::{GeminiService, LanguageModelService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use tokio_util::sync::CancellationToken;

/// Supported language-model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Gemini,
}

impl Provider {
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gemini" => Ok(Provider::Gemini),
            other => Err(Error::UnsupportedProvider(other.to_string())),
        }
    }
}

/// The backend chosen from configuration, one per process.
#[derive(Debug)]
pub enum Generator {
    Gemini(GeminiService),
}

impl Generator {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = config.llm.provider.parse::<Provider>().map_err(|e| {
            tracing::error!(provider = %config.llm.provider, "unsupported language model provider");
            e
        })?;
        tracing::info!(provider = %provider, "creating generator");

        match provider {
            Provider::Gemini => Ok(Generator::Gemini(GeminiService::from_config(config)?)),
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            Generator::Gemini(_) => Provider::Gemini,
        }
    }
}

#[async_trait]
impl LanguageModelService for Generator {
    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String> {
        match self {
            Generator::Gemini(service) => service.generate(cancel, prompt).await,
        }
    }

    fn provider_id(&self) -> &str {
        self.provider().id()
    }
}
