//! The extraction pipeline.
//!
//! [`DocumentScanner`] produces the page layout, [`DocumentParser`] pulls text,
//! tables and images out of each page, [`VlmImageAnalyzer`] annotates images
//! through the multimodal adapter and [`DocumentExtractor`] runs all three.

mod extractor;
mod language;
mod options;
mod parser;
mod scanner;
mod vlm;

pub use extractor::DocumentExtractor;
pub use language::{detect_language, is_hangul};
pub use options::{ErrorMode, ExtractOptions, ParseOptions};
pub use parser::DocumentParser;
pub use scanner::{DocumentScanner, TABLE_CONFIDENCE, TEXT_CONFIDENCE};
pub use vlm::{VlmImageAnalyzer, DEFAULT_VLM_CONFIDENCE};
