//! Provider credentials and endpoints loaded from the environment.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::llm::ProviderKind;

/// Default HTTP timeout for one provider request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Credentials and overrides for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub api_key: String,
    /// Endpoint root (e.g. `https://api.openai.com/v1`); provider default when unset
    pub base_url: Option<String>,
    /// Model name; provider default when unset
    pub model: Option<String>,
}

impl ProviderConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            model: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Configuration for every provider. A provider without a key is not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub openai: Option<ProviderConfig>,
    pub claude: Option<ProviderConfig>,
    pub gemini: Option<ProviderConfig>,
    pub perplexity: Option<ProviderConfig>,
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai: None,
            claude: None,
            gemini: None,
            perplexity: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl LlmConfig {
    /// Read the configuration from process environment variables.
    ///
    /// | Provider   | Key                                  | Overrides                                   |
    /// |------------|--------------------------------------|---------------------------------------------|
    /// | OpenAI     | `OPENAI_API_KEY`                     | `OPENAI_BASE_URL`, `OPENAI_MODEL`           |
    /// | Claude     | `ANTHROPIC_API_KEY`                  | `ANTHROPIC_BASE_URL`, `ANTHROPIC_MODEL`     |
    /// | Gemini     | `GOOGLE_API_KEY` or `GEMINI_API_KEY` | `GEMINI_BASE_URL`, `GEMINI_MODEL`           |
    /// | Perplexity | `PERPLEXITY_API_KEY`                 | `PERPLEXITY_BASE_URL`, `PERPLEXITY_MODEL`   |
    ///
    /// `LLM_REQUEST_TIMEOUT_SECS` sets the request timeout (default 120).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = |keys: &[&str], prefix: &str| {
            keys.iter().find_map(|k| get(*k)).map(|api_key| ProviderConfig {
                api_key,
                base_url: get(format!("{}_BASE_URL", prefix).as_str()),
                model: get(format!("{}_MODEL", prefix).as_str()),
            })
        };

        let request_timeout = match get("LLM_REQUEST_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    Error::Config(format!(
                        "LLM_REQUEST_TIMEOUT_SECS must be a positive integer, got '{}'",
                        v
                    ))
                })?,
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        Ok(Self {
            openai: provider(&["OPENAI_API_KEY"], "OPENAI"),
            claude: provider(&["ANTHROPIC_API_KEY"], "ANTHROPIC"),
            gemini: provider(&["GOOGLE_API_KEY", "GEMINI_API_KEY"], "GEMINI"),
            perplexity: provider(&["PERPLEXITY_API_KEY"], "PERPLEXITY"),
            request_timeout,
        })
    }

    /// Configuration for one provider, if present.
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        match kind {
            ProviderKind::OpenAi => self.openai.as_ref(),
            ProviderKind::Claude => self.claude.as_ref(),
            ProviderKind::Gemini => self.gemini.as_ref(),
            ProviderKind::Perplexity => self.perplexity.as_ref(),
        }
    }

    /// Providers that have a key.
    pub fn configured(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|k| self.provider(*k).is_some())
            .collect()
    }
}
