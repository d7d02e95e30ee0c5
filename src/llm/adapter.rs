//! The uniform adapter contract shared by every provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::ProviderKind;

/// Generation options. Unset fields fall back to the provider's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmOptions {
    /// Cap on generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling cutoff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Accepted for compatibility; responses are always returned whole.
    #[serde(default)]
    pub stream: bool,
}

impl LlmOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Resolve against provider defaults as `(max_tokens, temperature, top_p)`.
    pub(crate) fn resolve(&self, defaults: SamplingDefaults) -> (u32, f32, f32) {
        if self.stream {
            log::debug!("Streaming is not supported; returning the whole response");
        }
        (
            self.max_tokens.unwrap_or(defaults.max_tokens),
            self.temperature.unwrap_or(defaults.temperature),
            self.top_p.unwrap_or(defaults.top_p),
        )
    }
}

/// Provider defaults for unset [`LlmOptions`] fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SamplingDefaults {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// A generated completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// A base64-encoded image attached to a multimodal request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub mime_type: String,
    /// Standard base64, no data-URL prefix
    pub data: String,
}

impl ImageInput {
    /// `data:` URL form used by OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// An optional adapter capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Embed,
    Vision,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Embed => f.write_str("embeddings"),
            Capability::Vision => f.write_str("image input"),
        }
    }
}

/// Capabilities an adapter offers beyond text generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub embed: bool,
    pub vision: bool,
}

impl Capabilities {
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Embed => self.embed,
            Capability::Vision => self.vision,
        }
    }
}

/// One vendor's generation and embedding API.
///
/// `embed` and `generate_with_image` are optional: callers check
/// [`LlmAdapter::capabilities`] or handle [`Error::CapabilityNotSupported`].
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    /// Which provider this adapter talks to.
    fn provider(&self) -> ProviderKind;

    /// Optional capabilities.
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Generate a completion for a text prompt.
    async fn generate(&self, prompt: &str, options: &LlmOptions) -> Result<LlmResponse>;

    /// Generate a completion for a prompt with an attached image.
    async fn generate_with_image(
        &self,
        _prompt: &str,
        _image: &ImageInput,
        _options: &LlmOptions,
    ) -> Result<LlmResponse> {
        Err(Error::CapabilityNotSupported {
            provider: self.provider(),
            capability: Capability::Vision,
        })
    }

    /// Embed text into a vector.
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::CapabilityNotSupported {
            provider: self.provider(),
            capability: Capability::Embed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TextOnly;

    #[async_trait]
    impl LlmAdapter for TextOnly {
        fn provider(&self) -> ProviderKind {
            ProviderKind::Perplexity
        }

        async fn generate(&self, prompt: &str, _options: &LlmOptions) -> Result<LlmResponse> {
            Ok(LlmResponse {
                content: prompt.to_uppercase(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_optional_capabilities_default_to_unsupported() {
        let adapter = TextOnly;
        assert!(!adapter.capabilities().supports(Capability::Embed));

        let err = adapter.embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            Error::CapabilityNotSupported {
                capability: Capability::Embed,
                ..
            }
        ));

        let image = ImageInput {
            mime_type: "image/png".to_string(),
            data: "AAAA".to_string(),
        };
        let err = adapter
            .generate_with_image("describe", &image, &LlmOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CapabilityNotSupported {
                capability: Capability::Vision,
                ..
            }
        ));
    }

    #[test]
    fn test_options_resolve() {
        let defaults = SamplingDefaults {
            max_tokens: 4096,
            temperature: 0.7,
            top_p: 1.0,
        };
        assert_eq!(LlmOptions::new().resolve(defaults), (4096, 0.7, 1.0));

        let options = LlmOptions::new().with_max_tokens(256).with_temperature(0.0);
        assert_eq!(options.resolve(defaults), (256, 0.0, 1.0));
    }

    #[test]
    fn test_image_data_url() {
        let image = ImageInput {
            mime_type: "image/jpeg".to_string(),
            data: "/9j/".to_string(),
        };
        assert_eq!(image.data_url(), "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn test_usage_total() {
        assert_eq!(Usage::new(12, 30).total_tokens, 42);
    }

    #[test]
    fn test_usage_total_saturates() {
        assert_eq!(Usage::new(u32::MAX - 1, 10).total_tokens, u32::MAX);
    }
}
