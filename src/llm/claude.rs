//! Anthropic Messages API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ProviderConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::error::Result;

use super::adapter::{
    Capabilities, ImageInput, LlmAdapter, LlmOptions, LlmResponse, SamplingDefaults, Usage,
};
use super::http::HttpTransport;
use super::ProviderKind;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const API_VERSION: &str = "2023-06-01";

const DEFAULTS: SamplingDefaults = SamplingDefaults {
    max_tokens: 4096,
    temperature: 0.7,
    top_p: 1.0,
};

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: ImageSource<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    model: Option<String>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl MessagesResponse {
    fn into_response(self) -> LlmResponse {
        // Only the first block is read; a non-text first block yields empty content
        let content = match self.content.into_iter().next() {
            Some(ResponseBlock::Text { text }) => text,
            _ => String::new(),
        };
        LlmResponse {
            content,
            usage: self
                .usage
                .map(|u| Usage::new(u.input_tokens, u.output_tokens)),
            model: self.model,
        }
    }
}

/// Adapter for Claude. Has no embedding API.
#[derive(Debug, Clone)]
pub struct ClaudeAdapter {
    transport: HttpTransport,
    api_key: String,
    base_url: String,
    model: String,
}

impl ClaudeAdapter {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&ProviderConfig::new(api_key), DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(ProviderKind::Claude, timeout)?,
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

    async fn send(&self, content: Vec<ContentBlock<'_>>, options: &LlmOptions) -> Result<LlmResponse> {
        let (max_tokens, temperature, top_p) = options.resolve(DEFAULTS);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature,
            top_p,
            messages: vec![Message {
                role: "user",
                content,
            }],
        };

        let response: MessagesResponse = self
            .transport
            .post_json(
                &format!("{}/messages", self.base_url),
                &[
                    ("x-api-key", self.api_key.as_str()),
                    ("anthropic-version", API_VERSION),
                ],
                &request,
            )
            .await?;
        Ok(response.into_response())
    }
}

#[async_trait]
impl LlmAdapter for ClaudeAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            embed: false,
            vision: true,
        }
    }

    async fn generate(&self, prompt: &str, options: &LlmOptions) -> Result<LlmResponse> {
        self.send(vec![ContentBlock::Text { text: prompt }], options)
            .await
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &ImageInput,
        options: &LlmOptions,
    ) -> Result<LlmResponse> {
        let content = vec![
            ContentBlock::Image {
                source: ImageSource {
                    kind: "base64",
                    media_type: &image.mime_type,
                    data: &image.data,
                },
            },
            ContentBlock::Text { text: prompt },
        ];
        self.send(content, options).await
    }
}
