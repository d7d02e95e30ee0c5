//! LLM adapters and the task router.
//!
//! Each provider is wrapped in an [`LlmAdapter`]. An [`AdapterRegistry`] holds
//! the configured adapters and [`LlmRouter`] picks one per [`TaskType`]:
//!
//! | Task                                   | Provider   |
//! |----------------------------------------|------------|
//! | generate, summarize, reasoning         | OpenAI     |
//! | long_context, verification             | Claude     |
//! | multimodal                             | Gemini     |
//! | realtime_search                        | Perplexity |
//! | anything else                          | OpenAI     |

mod adapter;
mod claude;
mod gemini;
mod http;
mod openai;
mod perplexity;
mod router;

pub use adapter::{
    Capabilities, Capability, ImageInput, LlmAdapter, LlmOptions, LlmResponse, Usage,
};
pub use claude::ClaudeAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;
pub use perplexity::PerplexityAdapter;
pub use router::{AdapterRegistry, LlmRouter, ProviderKind, TaskType};
