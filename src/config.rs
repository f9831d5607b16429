//! YAML configuration.
//!
//! The file wraps everything in a top-level `spec:` key:
//!
//! ```yaml
//! spec:
//!   general:
//!     api_key: "..."
//!     graceful_shutdown_wait_time_sec: 5
//!     log_level: info
//!   llm:
//!     provider: gemini
//!     keywords: "career, jobs"
//!     gemini:
//!       model: gemini-1.5-flash
//!       max_requests_per_minute: 15
//! ```
//!
//! The path is taken from `--config`, else `PROMPTME_CONFIG`, else `SPEC_FILE`, else
//! `./.config.yml`.
//! `PROMPTME_API_KEY` overrides `general.api_key`.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "PROMPTME_CONFIG";
/// Older name for [`CONFIG_PATH_ENV`], still honored.
pub const LEGACY_CONFIG_PATH_ENV: &str = "SPEC_FILE";
pub const API_KEY_ENV: &str = "PROMPTME_API_KEY";
pub const DEFAULT_CONFIG_PATH: &str = ".config.yml";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Deserialize)]
struct ConfigFile {
    spec: Config,
}

/// Process-wide settings, loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub general: GeneralConfig,
    pub llm: LlmConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub api_key: String,
    pub graceful_shutdown_wait_time_sec: u64,
    pub log_level: String,
}

impl std::fmt::Debug for GeneralConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneralConfig")
            .field("api_key", &"<redacted>")
            .field(
                "graceful_shutdown_wait_time_sec",
                &self.graceful_shutdown_wait_time_sec,
            )
            .field("log_level", &self.log_level)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    /// Topic restriction prepended to every chat session when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub model: String,
    pub max_requests_per_minute: u32,
    /// Bucket capacity; defaults to `max_requests_per_minute`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst: Option<u32>,
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

fn default_true() -> bool {
    true
}

fn default_gemini_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

impl Config {
    /// Load, apply environment overrides, and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(path, |key| std::env::var(key).ok());
        let content = std::fs::read_to_string(&path).map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "failed to read config file");
            Error::Io(e)
        })?;

        let mut config = Self::parse_yaml(&content)?;
        config.apply_api_key_override(std::env::var(API_KEY_ENV).ok());
        config.validate()?;

        tracing::debug!(
            path = %path.display(),
            provider = %config.llm.provider,
            model = %config.llm.gemini.model,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate a YAML document without touching the environment.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config = Self::parse_yaml(content)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_yaml(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                "invalid config file",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })?;
        Ok(file.spec)
    }

    fn resolve_path(path: Option<&Path>, lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
        if let Some(p) = path {
            return p.to_path_buf();
        }
        [CONFIG_PATH_ENV, LEGACY_CONFIG_PATH_ENV]
            .into_iter()
            .filter_map(&lookup)
            .find(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Replace the configured credential with a non-empty override.
    pub fn apply_api_key_override(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            tracing::debug!("api key taken from {}", API_KEY_ENV);
            self.general.api_key = key;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.api_key.trim().is_empty() {
            return Err(Error::configuration("spec.general.api_key", "must not be empty"));
        }
        if self.general.graceful_shutdown_wait_time_sec == 0 {
            return Err(Error::configuration(
                "spec.general.graceful_shutdown_wait_time_sec",
                "must be greater than zero",
            ));
        }
        if self.general.log_level.trim().is_empty() {
            return Err(Error::configuration("spec.general.log_level", "must not be empty"));
        }
        if self.llm.provider.trim().is_empty() {
            return Err(Error::configuration("spec.llm.provider", "must not be empty"));
        }
        if self.llm.gemini.model.trim().is_empty() {
            return Err(Error::configuration("spec.llm.gemini.model", "must not be empty"));
        }
        if self.llm.gemini.max_requests_per_minute == 0 {
            return Err(Error::configuration(
                "spec.llm.gemini.max_requests_per_minute",
                "must be greater than zero",
            ));
        }
        if self.llm.gemini.burst == Some(0) {
            return Err(Error::configuration(
                "spec.llm.gemini.burst",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn shutdown_wait(&self) -> Duration {
        Duration::from_secs(self.general.graceful_shutdown_wait_time_sec)
    }

    /// Configured keywords, `None` when absent or blank.
    pub fn keywords(&self) -> Option<&str> {
        self.llm
            .keywords
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}
