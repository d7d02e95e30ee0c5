//! Error types for docextract.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::llm::{Capability, ProviderKind};

/// Result type alias for docextract operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting documents or calling LLM providers.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file cannot be opened or parsed as a PDF. Fatal for the extraction.
    #[error("Document unreadable: {0}")]
    DocumentUnreadable(String),

    /// A single page could not be parsed.
    #[error("Failed to parse page {page}: {message}")]
    PageParse { page: u32, message: String },

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The router has no adapter registered for the provider.
    #[error("Adapter not available: {0}")]
    AdapterUnavailable(ProviderKind),

    /// A vendor API call failed (network, auth, rate limit, bad response).
    #[error("{provider} request failed{}: {message}", status_suffix(.status))]
    Provider {
        provider: ProviderKind,
        status: Option<u16>,
        message: String,
    },

    /// The adapter does not offer the requested capability.
    #[error("{provider} does not support {capability}")]
    CapabilityNotSupported {
        provider: ProviderKind,
        capability: Capability,
    },

    /// An operation exceeded its time budget.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error during output rendering.
    #[error("Rendering error: {0}")]
    Render(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {})", code),
        None => String::new(),
    }
}

impl Error {
    /// Build a provider error without an HTTP status.
    pub fn provider(provider: ProviderKind, message: impl Into<String>) -> Self {
        Error::Provider {
            provider,
            status: None,
            message: message.into(),
        }
    }

    /// Whether the error only affects one page or image rather than the whole document.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::DocumentUnreadable(_) | Error::Io(_))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::DocumentUnreadable(err.to_string())
    }
}
