//! Google Gemini `generateContent` and `embedContent`.

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

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

const DEFAULTS: SamplingDefaults = SamplingDefaults {
    max_tokens: 4096,
    temperature: 0.7,
    top_p: 1.0,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part<'a> {
    Text(&'a str),
    InlineData(InlineData<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    total_token_count: Option<u32>,
}

impl GenerateResponse {
    fn into_response(self, model: &str) -> LlmResponse {
        let content = self
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        LlmResponse {
            content,
            usage: self.usage_metadata.map(|u| {
                let mut usage = Usage::new(u.prompt_token_count, u.candidates_token_count);
                if let Some(total) = u.total_token_count {
                    usage.total_tokens = total;
                }
                usage
            }),
            model: Some(self.model_version.unwrap_or_else(|| model.to_string())),
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    content: Content<'a>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Embedding,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

/// Adapter for Gemini. Serves multimodal analysis.
#[derive(Debug, Clone)]
pub struct GeminiAdapter {
    transport: HttpTransport,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: String,
}

impl GeminiAdapter {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::from_config(&ProviderConfig::new(api_key), DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(ProviderKind::Gemini, timeout)?,
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

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn generate_parts(&self, parts: Vec<Part<'_>>, options: &LlmOptions) -> Result<LlmResponse> {
        let (max_output_tokens, temperature, top_p) = options.resolve(DEFAULTS);
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts,
            }],
            generation_config: GenerationConfig {
                max_output_tokens,
                temperature,
                top_p,
            },
        };

        let response: GenerateResponse = self
            .transport
            .post_json(
                &self.endpoint(&self.model, "generateContent"),
                &[("x-goog-api-key", self.api_key.as_str())],
                &request,
            )
            .await?;
        Ok(response.into_response(&self.model))
    }
}

#[async_trait]
impl LlmAdapter for GeminiAdapter {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            embed: true,
            vision: true,
        }
    }

    async fn generate(&self, prompt: &str, options: &LlmOptions) -> Result<LlmResponse> {
        self.generate_parts(vec![Part::Text(prompt)], options).await
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &ImageInput,
        options: &LlmOptions,
    ) -> Result<LlmResponse> {
        let parts = vec![
            Part::Text(prompt),
            Part::InlineData(InlineData {
                mime_type: &image.mime_type,
                data: &image.data,
            }),
        ];
        self.generate_parts(parts, options).await
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            content: Content {
                role: None,
                parts: vec![Part::Text(text)],
            },
        };
        let response: EmbedResponse = self
            .transport
            .post_json(
                &self.endpoint(&self.embedding_model, "embedContent"),
                &[("x-goog-api-key", self.api_key.as_str())],
                &request,
            )
            .await?;

        if response.embedding.values.is_empty() {
            return Err(Error::provider(ProviderKind::Gemini, "empty embedding"));
        }
        Ok(response.embedding.values)
    }
}
