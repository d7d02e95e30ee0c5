//! PDF backend abstraction layer.
//!
//! The scanner and parser see a document only through [`PdfBackend`], a
//! page-oriented interface (words with boxes, plain text, table grids,
//! embedded images, page size). [`LopdfBackend`] implements it on top of
//! `lopdf`; tests substitute in-memory backends.

mod content;
mod lopdf_backend;
mod tables;

pub use content::{group_spans_into_lines, spans_to_words, TextLine, TextSpan};
pub use lopdf_backend::LopdfBackend;
pub use tables::{DetectedTable, TableDetector, TableDetectorConfig, TableRowData};

use crate::error::Result;
use crate::model::DocumentMetadata;

/// A row-major grid of table cells.
pub type TableGrid = Vec<Vec<String>>;

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// US Letter, used when a page declares no MediaBox.
    pub fn letter() -> Self {
        Self::new(612.0, 792.0)
    }
}

/// A word-level token with its box in page-local coordinates (origin top-left).
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl Word {
    pub fn new(text: impl Into<String>, x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            text: text.into(),
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// Edges as `(x0, top, x1, bottom)`.
    pub fn edges(&self) -> (f32, f32, f32, f32) {
        (self.x0, self.top, self.x1, self.bottom)
    }
}

/// An image XObject embedded in a page.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    /// XObject resource name (e.g. "Im1").
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl EmbeddedImage {
    /// File extension for the image encoding, if it can be written as-is.
    pub fn file_extension(&self) -> Option<&'static str> {
        match self.mime_type.as_str() {
            "image/jpeg" => Some("jpg"),
            "image/jp2" => Some("jp2"),
            _ => None,
        }
    }
}

/// Page-oriented access to a PDF document.
///
/// Page numbers are 1-indexed.
pub trait PdfBackend: Send + Sync {
    /// Number of pages, known up front.
    fn page_count(&self) -> u32;

    /// Document information (title, author, creation date).
    fn metadata(&self) -> DocumentMetadata;

    /// Page width and height.
    fn page_size(&self, page: u32) -> Result<PageSize>;

    /// Word tokens with their boxes.
    fn extract_words(&self, page: u32) -> Result<Vec<Word>>;

    /// Plain text content of the page, lines separated by `\n`.
    fn extract_text(&self, page: u32) -> Result<String>;

    /// Detected tables as cell grids.
    fn extract_tables(&self, page: u32) -> Result<Vec<TableGrid>>;

    /// Embedded images. Backends without image support return nothing.
    fn extract_images(&self, _page: u32) -> Result<Vec<EmbeddedImage>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_image_extension() {
        let mut image = EmbeddedImage {
            name: "Im1".to_string(),
            mime_type: "image/jpeg".to_string(),
            data: vec![0xFF, 0xD8],
            width: Some(10),
            height: Some(10),
        };
        assert_eq!(image.file_extension(), Some("jpg"));
        image.mime_type = "image/jp2".to_string();
        assert_eq!(image.file_extension(), Some("jp2"));
        // Raw pixel data is never a valid PNG file
        for mime in ["image/png", "application/octet-stream"] {
            image.mime_type = mime.to_string();
            assert_eq!(image.file_extension(), None);
        }
    }

    #[test]
    fn test_word_edges() {
        let word = Word::new("Outlook", 10.0, 20.0, 52.0, 32.0);
        assert_eq!(word.edges(), (10.0, 20.0, 52.0, 32.0));
    }
}
