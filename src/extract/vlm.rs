//! Chart and figure analysis through the multimodal adapter.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::error::Result;
use crate::llm::{ImageInput, LlmOptions, LlmRouter, TaskType};
use crate::model::VlmResult;

/// Confidence assigned when the model does not report one.
pub const DEFAULT_VLM_CONFIDENCE: f32 = 0.9;

/// Sends extracted images to the adapter serving [`TaskType::Multimodal`].
#[derive(Clone)]
pub struct VlmImageAnalyzer {
    router: LlmRouter,
    options: LlmOptions,
}

impl VlmImageAnalyzer {
    pub fn new(router: LlmRouter) -> Self {
        Self {
            router,
            options: LlmOptions::default(),
        }
    }

    pub fn with_options(mut self, options: LlmOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &LlmOptions {
        &self.options
    }

    /// Analyze one image file.
    ///
    /// Fails with [`crate::Error::AdapterUnavailable`] when no multimodal
    /// adapter is registered, or with the adapter's own error.
    pub async fn analyze(&self, image_path: &Path, image_type: &str) -> Result<VlmResult> {
        let adapter = self.router.adapter_for(TaskType::Multimodal)?;

        let bytes = tokio::fs::read(image_path).await?;
        let image = ImageInput {
            mime_type: mime_type_for(image_path, image_type),
            data: STANDARD.encode(&bytes),
        };

        log::debug!(
            "Analyzing {} ({} bytes) with {}",
            image_path.display(),
            bytes.len(),
            adapter.provider()
        );

        let response = adapter
            .generate_with_image(&build_prompt(image_type), &image, &self.options)
            .await?;

        Ok(parse_response(&response.content))
    }
}

fn build_prompt(image_type: &str) -> String {
    format!(
        "Analyze this {image_type} taken from a securities research report.\n\
         1. Identify the chart or graph type, if any.\n\
         2. Extract the numeric data points shown.\n\
         3. Transcribe any text in the image.\n\
         Respond with a single JSON object with the keys \"chartType\" (string), \
         \"data\" (array), \"text\" (string) and \"confidence\" (number between 0 and 1)."
    )
}

/// MIME type for the request, preferring a label that already is one.
fn mime_type_for(path: &Path, image_type: &str) -> String {
    if image_type.starts_with("image/") {
        return image_type.to_string();
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("jp2") => "image/jp2",
        _ => "image/jpeg",
    }
    .to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredAnalysis {
    chart_type: Option<String>,
    data: Option<serde_json::Value>,
    text: Option<String>,
    confidence: Option<f32>,
}

/// Interpret the model output as structured JSON, falling back to raw text.
fn parse_response(content: &str) -> VlmResult {
    match serde_json::from_str::<StructuredAnalysis>(strip_code_fence(content)) {
        Ok(parsed) => VlmResult {
            chart_type: parsed.chart_type.filter(|s| !s.is_empty()),
            data: parsed.data.and_then(|d| match d {
                serde_json::Value::Array(items) => Some(items),
                serde_json::Value::Null => None,
                other => Some(vec![other]),
            }),
            text: parsed.text.filter(|s| !s.is_empty()),
            confidence: parsed
                .confidence
                .filter(|c| c.is_finite())
                .map(|c| c.clamp(0.0, 1.0))
                .unwrap_or(DEFAULT_VLM_CONFIDENCE),
        },
        Err(_) => VlmResult {
            text: Some(content.trim().to_string()),
            confidence: DEFAULT_VLM_CONFIDENCE,
            ..Default::default()
        },
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
