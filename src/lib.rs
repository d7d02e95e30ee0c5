//! # docextract
//!
//! PDF document extraction with multimodal image analysis and multi-provider
//! LLM routing.
//!
//! The pipeline runs in three stages:
//!
//! 1. [`DocumentScanner`] analyzes page layout into typed regions
//!    (text, table) with bounding boxes and confidence.
//! 2. [`DocumentParser`] extracts page text (tagged `ko`/`en`), table grids and
//!    embedded images.
//! 3. [`VlmImageAnalyzer`] sends each image to the multimodal adapter chosen by
//!    the [`LlmRouter`]; failures degrade only the affected image.
//!
//! [`DocumentExtractor`] runs all three and returns an [`ExtractionResult`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use docextract::{DocumentExtractor, ExtractOptions, LlmRouter, ParseOptions, VlmImageAnalyzer};
//!
//! # async fn run() -> docextract::Result<()> {
//! let router = LlmRouter::from_env()?;
//! let options = ExtractOptions::new()
//!     .with_parse_options(ParseOptions::new().with_image_dir("./images"));
//! let extractor = DocumentExtractor::with_options(options)
//!     .with_analyzer(VlmImageAnalyzer::new(router));
//!
//! let result = extractor.extract("report.pdf").await?;
//! println!("{}", docextract::render::to_json(&result, docextract::JsonFormat::Pretty)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Routing
//!
//! ```no_run
//! use docextract::{LlmOptions, LlmRouter, TaskType};
//!
//! # async fn run() -> docextract::Result<()> {
//! let router = LlmRouter::from_env()?;
//! let response = router
//!     .route(TaskType::Summarize, "Summarize this report...", &LlmOptions::default())
//!     .await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod llm;
pub mod model;
pub mod render;

// Re-export commonly used types
pub use backend::{LopdfBackend, PdfBackend};
pub use config::{LlmConfig, ProviderConfig};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use error::{Error, Result};
pub use extract::{
    DocumentExtractor, DocumentParser, DocumentScanner, ErrorMode, ExtractOptions, ParseOptions,
    VlmImageAnalyzer,
};
pub use llm::{
    AdapterRegistry, Capabilities, Capability, LlmAdapter, LlmOptions, LlmResponse, LlmRouter,
    ProviderKind, TaskType,
};
pub use model::{
    BBox, Confidence, DocumentMetadata, ElementType, ExtractedImage, ExtractedTable,
    ExtractedText, ExtractionIssue, ExtractionResult, IssueKind, Language, LayoutElement,
    LayoutInfo, PageLayout, ParsedDocument, VlmResult,
};
pub use render::JsonFormat;

use std::path::Path;

/// Scan the layout of a PDF file.
///
/// # Example
///
/// ```no_run
/// let layout = docextract::scan_file("report.pdf").unwrap();
/// assert_eq!(layout.pages.len() as u32, layout.metadata.page_count);
/// ```
pub fn scan_file<P: AsRef<Path>>(path: P) -> Result<LayoutInfo> {
    DocumentScanner::new().scan(path)
}

/// Scan and parse a PDF file without image analysis.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsedDocument> {
    let backend = LopdfBackend::load_file(path)?;
    let layout = DocumentScanner::new().scan_backend(&backend)?;
    DocumentParser::new().parse_backend(&backend, &layout)
}

/// Extract plain text from a PDF file, pages separated by blank lines.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let parsed = parse_file(path)?;
    Ok(parsed
        .texts
        .iter()
        .map(|t| t.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n"))
}

/// Run the full extraction on a PDF file without image analysis.
pub async fn extract_file<P: AsRef<Path>>(path: P) -> Result<ExtractionResult> {
    DocumentExtractor::new().extract(path).await
}

/// Run the full extraction and render the result as JSON.
pub async fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let result = extract_file(path).await?;
    render::to_json(&result, format)
}
