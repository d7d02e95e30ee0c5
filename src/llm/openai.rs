//! OpenAI chat completions and embeddings.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ProviderConfig, DEFAULT_REQUEST_TIMEOUT};
use crate::error::{Error, Result};

use super::adapter::{
    Capabilities, ImageInput, LlmAdapter, LlmOptions, LlmResponse, SamplingDefaults, Usage,
};
use super::http::HttpTransport;
use super::ProviderKind;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";

const DEFAULTS: SamplingDefaults = SamplingDefaults {
    max_tokens: 4000,
    temperature: 0.7,
    top_p: 1.0,
};

/// Chat completion request. Also used for OpenAI-compatible APIs.
#[derive(Debug, Serialize)]
pub(super) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

#[derive(Debug, Serialize)]
pub(super) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: MessageContent<'a>,
}

impl<'a> ChatMessage<'a> {
    pub fn user(prompt: &'a str) -> Self {
        Self {
            role: "user",
            content: MessageContent::Text(prompt),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(super) enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub(super) struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    total_tokens: Option<u32>,
}

impl ChatResponse {
    /// First choice's text, empty when the provider returned none.
    pub fn into_response(self) -> LlmResponse {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        LlmResponse {
            content,
            usage: self.usage.map(|u| {
                let mut usage = Usage::new(u.prompt_tokens, u.completion_tokens);
                if let Some(total) = u.total_tokens {
                    usage.total_tokens = total;
                }
                usage
            }),
            model: self.model,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Adapter for the OpenAI API.
#[derive(Debug, Clone)]
pub struct OpenAiAdapter {
    transport: HttpTransport,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
}

impl OpenAiAdapter {
    /// Adapter with default endpoint, model and timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&ProviderConfig::new(api_key), DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(ProviderKind::OpenAi, timeout)?,
            api_key: config.api_key.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, messages: Vec<ChatMessage<'_>>, options: &LlmOptions) -> Result<LlmResponse> {
        let (max_tokens, temperature, top_p) = options.resolve(DEFAULTS);
        let request = ChatRequest {
            model: &self.model,
            messages,
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

#[async_trait]
impl LlmAdapter for OpenAiAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            embed: true,
            vision: true,
        }
    }

    async fn generate(&self, prompt: &str, options: &LlmOptions) -> Result<LlmResponse> {
        self.chat(vec![ChatMessage::user(prompt)], options).await
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &ImageInput,
        options: &LlmOptions,
    ) -> Result<LlmResponse> {
        let message = ChatMessage {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: prompt },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                },
            ]),
        };
        self.chat(vec![message], options).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let auth = format!("Bearer {}", self.api_key);
        let response: EmbeddingResponse = self
            .transport
            .post_json(
                &format!("{}/embeddings", self.base_url),
                &[("Authorization", auth.as_str())],
                &EmbeddingRequest {
                    model: &self.embedding_model,
                    input: text,
                },
            )
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::provider(ProviderKind::OpenAi, "embedding response had no data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_shape() {
        let request = ChatRequest {
            model: "gpt-4o",
            messages: vec![ChatMessage::user("Summarize the report")],
            max_tokens: 4000,
            temperature: 0.5,
            top_p: 1.0,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "model": "gpt-4o",
                "messages": [{"role": "user", "content": "Summarize the report"}],
                "max_tokens": 4000,
                "temperature": 0.5,
                "top_p": 1.0
            })
        );
    }

    #[test]
    fn test_image_message_shape() {
        let message = ChatMessage {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: "Describe" },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: "data:image/png;base64,AAAA".to_string(),
                    },
                },
            ]),
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "Describe"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                ]
            })
        );
    }

    #[test]
    fn test_chat_response_parsing() {
        let body = json!({
            "model": "gpt-4o-2024-08-06",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Buy"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        });
        let response: ChatResponse = serde_json::from_value(body).unwrap();
        let response = response.into_response();
        assert_eq!(response.content, "Buy");
        assert_eq!(response.usage, Some(Usage::new(10, 2)));
        assert_eq!(response.model.as_deref(), Some("gpt-4o-2024-08-06"));
    }

    #[test]
    fn test_empty_choices() {
        let response: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        let response = response.into_response();
        assert_eq!(response.content, "");
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_embedding_response_parsing() {
        let body = json!({"data": [{"embedding": [0.1, -0.2], "index": 0}]});
        let response: EmbeddingResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.data[0].embedding, vec![0.1, -0.2]);
    }

    #[test]
    fn test_from_config_overrides() {
        let config = ProviderConfig::new("sk-test")
            .with_base_url("http://localhost:8080/v1")
            .with_model("gpt-4o-mini");
        let adapter = OpenAiAdapter::from_config(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(adapter.model(), "gpt-4o-mini");
        assert_eq!(adapter.base_url, "http://localhost:8080/v1");
        assert!(adapter.capabilities().embed);
    }
}
