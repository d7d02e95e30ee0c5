//! Data model shared by the scanner, parser, analyzer and extractor.
//!
//! Every value is created fresh per extraction and is serializable to the
//! JSON shape consumed by the reporting backend (camelCase keys, bounding
//! boxes as `[x, y, width, height]` arrays).

mod extraction;
mod layout;

pub use extraction::{
    Confidence, ExtractedImage, ExtractedTable, ExtractedText, ExtractionIssue, ExtractionResult,
    IssueKind, Language, ParsedDocument, VlmResult,
};
pub use layout::{BBox, DocumentMetadata, ElementType, LayoutElement, LayoutInfo, PageLayout};
