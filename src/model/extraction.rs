//! Extraction records and the final result of one `extract()` call.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{BBox, DocumentMetadata};

/// Qualitative confidence tag on extraction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Language tag assigned to extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Ko,
    En,
}

impl Language {
    /// Two-letter code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Ko => "ko",
            Language::En => "en",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Plain text of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedText {
    pub content: String,
    pub page_number: u32,
    pub bbox: BBox,
    pub confidence: Confidence,
    pub language: Language,
}

/// A table as a row-major grid of cells. Rows may be ragged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTable {
    pub page_number: u32,
    pub data: Vec<Vec<String>>,
    pub bbox: BBox,
    pub confidence: Confidence,
}

impl ExtractedTable {
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    pub fn column_count(&self) -> usize {
        self.data.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}

/// An image written to disk, optionally annotated by the VLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedImage {
    pub page_number: u32,
    pub image_path: PathBuf,
    /// Free-form label passed to the VLM prompt (MIME type for embedded images).
    pub image_type: String,
    pub bbox: BBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_result: Option<VlmResult>,
}

impl ExtractedImage {
    pub fn new(
        page_number: u32,
        image_path: impl Into<PathBuf>,
        image_type: impl Into<String>,
        bbox: BBox,
    ) -> Self {
        Self {
            page_number,
            image_path: image_path.into(),
            image_type: image_type.into(),
            bbox,
            analysis_result: None,
        }
    }
}

/// Output of the VLM image analyzer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VlmResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub confidence: f32,
}

/// Where a recoverable failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    PageParse,
    ImageAnalysis,
}

/// A recoverable failure recorded instead of aborting the extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionIssue {
    pub kind: IssueKind,
    pub page_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,
    pub message: String,
}

impl ExtractionIssue {
    pub fn page(page_number: u32, message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::PageParse,
            page_number,
            image_path: None,
            message: message.into(),
        }
    }

    pub fn image(image: &ExtractedImage, message: impl Into<String>) -> Self {
        Self {
            kind: IssueKind::ImageAnalysis,
            page_number: image.page_number,
            image_path: Some(image.image_path.clone()),
            message: message.into(),
        }
    }
}

/// Parser output before VLM enrichment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    pub texts: Vec<ExtractedText>,
    pub tables: Vec<ExtractedTable>,
    pub images: Vec<ExtractedImage>,
    /// Per-page failures collected in lenient mode.
    pub errors: Vec<ExtractionIssue>,
}

/// Final output of one extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub texts: Vec<ExtractedText>,
    pub tables: Vec<ExtractedTable>,
    pub images: Vec<ExtractedImage>,
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub errors: Vec<ExtractionIssue>,
}

impl ExtractionResult {
    /// Whether every page parsed and every image was annotated.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Concatenated text of all pages, in page order.
    pub fn plain_text(&self) -> String {
        self.texts
            .iter()
            .map(|t| t.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
