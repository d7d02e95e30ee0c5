//! JSON-over-HTTPS transport shared by the adapters.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

use super::ProviderKind;

/// Longest provider error body kept in an error message.
const MAX_ERROR_BODY: usize = 500;

/// A `reqwest` client bound to one provider for error attribution.
#[derive(Debug, Clone)]
pub(crate) struct HttpTransport {
    client: Client,
    provider: ProviderKind,
}

impl HttpTransport {
    pub fn new(provider: ProviderKind, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("HTTP client for {}: {}", provider, e)))?;
        Ok(Self { client, provider })
    }

    /// POST `body` as JSON and decode the JSON response.
    ///
    /// Non-2xx responses become [`Error::Provider`] carrying the status code.
    pub async fn post_json<B, R>(&self, url: &str, headers: &[(&str, &str)], body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(url).json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| self.request_error(e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            log::warn!("{} returned HTTP {}: {}", self.provider, status.as_u16(), message);
            return Err(Error::Provider {
                provider: self.provider,
                status: Some(status.as_u16()),
                message,
            });
        }

        response.json::<R>().await.map_err(|e| self.request_error(e))
    }

    fn request_error(&self, err: reqwest::Error) -> Error {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_decode() {
            format!("invalid response body: {}", err)
        } else {
            err.to_string()
        };
        Error::Provider {
            provider: self.provider,
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }
}

/// Pull a human-readable message out of a provider error body.
///
/// All four providers use `{"error": {"message": ...}}`; anything else is
/// returned as (truncated) text.
fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }

    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.pointer("/error"))
                .and_then(|m| m.as_str().map(String::from))
        });

    Some(from_json.unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect()))
}
