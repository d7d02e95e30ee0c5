//! Task-type routing over a typed adapter registry.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::adapter::{LlmAdapter, LlmOptions, LlmResponse};
use super::claude::ClaudeAdapter;
use super::gemini::GeminiAdapter;
use super::openai::OpenAiAdapter;
use super::perplexity::PerplexityAdapter;

/// An LLM vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProviderKind {
    OpenAi,
    Claude,
    Gemini,
    Perplexity,
}

impl ProviderKind {
    /// Provider used for tasks without a dedicated mapping.
    pub const DEFAULT: ProviderKind = ProviderKind::OpenAi;

    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAi,
        ProviderKind::Claude,
        ProviderKind::Gemini,
        ProviderKind::Perplexity,
    ];

    /// Registry name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Claude => "claude",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Perplexity => "perplexity",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "perplexity" => Ok(ProviderKind::Perplexity),
            other => Err(Error::Config(format!("unknown provider '{}'", other))),
        }
    }
}

/// Abstract task categories the router dispatches on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskType {
    Generate,
    Summarize,
    LongContext,
    Multimodal,
    RealtimeSearch,
    Reasoning,
    Verification,
    /// Any other task name; served by [`ProviderKind::DEFAULT`].
    Unrecognized(String),
}

impl TaskType {
    /// Parse a task name. Never fails: unknown names become [`TaskType::Unrecognized`].
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "generate" => TaskType::Generate,
            "summarize" => TaskType::Summarize,
            "long_context" => TaskType::LongContext,
            "multimodal" => TaskType::Multimodal,
            "realtime_search" => TaskType::RealtimeSearch,
            "reasoning" => TaskType::Reasoning,
            "verification" => TaskType::Verification,
            _ => TaskType::Unrecognized(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskType::Generate => "generate",
            TaskType::Summarize => "summarize",
            TaskType::LongContext => "long_context",
            TaskType::Multimodal => "multimodal",
            TaskType::RealtimeSearch => "realtime_search",
            TaskType::Reasoning => "reasoning",
            TaskType::Verification => "verification",
            TaskType::Unrecognized(name) => name,
        }
    }

    /// The provider that serves this task.
    pub fn provider(&self) -> ProviderKind {
        match self {
            TaskType::Generate | TaskType::Summarize | TaskType::Reasoning => ProviderKind::OpenAi,
            TaskType::LongContext | TaskType::Verification => ProviderKind::Claude,
            TaskType::Multimodal => ProviderKind::Gemini,
            TaskType::RealtimeSearch => ProviderKind::Perplexity,
            TaskType::Unrecognized(_) => ProviderKind::DEFAULT,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapters keyed by provider, built once and shared read-only.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ProviderKind, Arc<dyn LlmAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the adapters for every configured provider.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let timeout = config.request_timeout;
        let mut registry = Self::new();
        if let Some(c) = &config.openai {
            registry.register(Arc::new(OpenAiAdapter::from_config(c, timeout)?));
        }
        if let Some(c) = &config.claude {
            registry.register(Arc::new(ClaudeAdapter::from_config(c, timeout)?));
        }
        if let Some(c) = &config.gemini {
            registry.register(Arc::new(GeminiAdapter::from_config(c, timeout)?));
        }
        if let Some(c) = &config.perplexity {
            registry.register(Arc::new(PerplexityAdapter::from_config(c, timeout)?));
        }
        log::debug!("Registered providers: {:?}", registry.providers());
        Ok(registry)
    }

    /// Add an adapter, replacing any previous one for the same provider.
    pub fn register(&mut self, adapter: Arc<dyn LlmAdapter>) -> &mut Self {
        self.adapters.insert(adapter.provider(), adapter);
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn LlmAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    /// Registered providers in a stable order.
    pub fn providers(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.adapters.keys().copied().collect();
        kinds.sort();
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Dispatches prompts to the adapter serving each task type.
///
/// No retry or failover: a failing adapter fails the call.
#[derive(Clone)]
pub struct LlmRouter {
    registry: Arc<AdapterRegistry>,
}

impl LlmRouter {
    pub fn new(registry: AdapterRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Router over the providers configured in the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(AdapterRegistry::from_config(&LlmConfig::from_env()?)?))
    }

    /// The adapter serving `task`.
    pub fn adapter_for(&self, task: TaskType) -> Result<Arc<dyn LlmAdapter>> {
        let kind = task.provider();
        log::debug!("Routing task '{}' to {}", task, kind);
        self.registry
            .get(kind)
            .ok_or(Error::AdapterUnavailable(kind))
    }

    /// Generate a completion with the adapter serving `task`.
    pub async fn route(
        &self,
        task: TaskType,
        prompt: &str,
        options: &LlmOptions,
    ) -> Result<LlmResponse> {
        let adapter = self.adapter_for(task)?;
        adapter.generate(prompt, options).await
    }

    pub fn get_adapter(&self, kind: ProviderKind) -> Option<Arc<dyn LlmAdapter>> {
        self.registry.get(kind)
    }

    /// Lookup by registry name (`"openai"`, `"claude"`, `"gemini"`, `"perplexity"`).
    pub fn get_adapter_by_name(&self, name: &str) -> Option<Arc<dyn LlmAdapter>> {
        name.parse::<ProviderKind>()
            .ok()
            .and_then(|kind| self.get_adapter(kind))
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }
}
