//! Perplexity search-grounded chat. OpenAI-compatible wire format.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{ProviderConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::error::Result;

use super::adapter::{LlmAdapter, LlmOptions, LlmResponse, SamplingDefaults};
use super::http::HttpTransport;
use super::openai::{ChatMessage, ChatRequest, ChatResponse};
use super::ProviderKind;

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar";

const DEFAULTS: SamplingDefaults = SamplingDefaults {
    max_tokens: 100_000,
    temperature: 0.2,
    top_p: 0.9,
};

/// Adapter for Perplexity. Text generation only.
#[derive(Debug, Clone)]
pub struct PerplexityAdapter {
    transport: HttpTransport,
    api_key: String,
    base_url: String,
    model: String,
}

impl PerplexityAdapter {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&ProviderConfig::new(api_key), DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(ProviderKind::Perplexity, timeout)?,
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LlmAdapter for PerplexityAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Perplexity
    }

    async fn generate(&self, prompt: &str, options: &LlmOptions) -> Result<LlmResponse> {
        let (max_tokens, temperature, top_p) = options.resolve(DEFAULTS);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage::user(prompt)],
            max_tokens,
            temperature,
            top_p,
        };

        let auth = format!("Bearer {}", self.api_key);
        let response: ChatResponse = self
            .transport
            .post_json(
                &format!("{}/chat/completions", self.base_url),
                &[("Authorization", auth.as_str())],
                &request,
            )
            .await?;
        Ok(response.into_response())
    }
}
