//! Parsing and extraction options.

use std::path::PathBuf;
use std::time::Duration;

use crate::llm::LlmOptions;

/// Error handling mode during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Abort on the first page that fails to parse
    Strict,
    /// Record page failures and continue with the remaining pages
    #[default]
    Lenient,
}

/// Options for the document parser.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Whether to parse pages in parallel
    pub parallel: bool,

    /// Directory embedded images are written to (`None` skips image extraction)
    pub image_dir: Option<PathBuf>,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Abort on the first page error.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Write embedded images into `dir`.
    pub fn with_image_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_dir = Some(dir.into());
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            parallel: true,
            image_dir: None,
        }
    }
}

/// Options for a full extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Parser options
    pub parse: ParseOptions,

    /// Whether to run VLM analysis on extracted images
    pub analyze_images: bool,

    /// Maximum number of image analyses in flight
    pub max_concurrent_analyses: usize,

    /// Time budget for a single image analysis
    pub analysis_timeout: Duration,

    /// Time budget for the whole analysis phase
    pub deadline: Option<Duration>,

    /// Generation options passed to the multimodal adapter
    pub vlm_options: LlmOptions,
}

impl ExtractOptions {
    /// Create new extraction options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set parser options.
    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    /// Enable or disable image analysis.
    pub fn with_image_analysis(mut self, analyze: bool) -> Self {
        self.analyze_images = analyze;
        self
    }

    /// Set the analysis concurrency limit (at least 1).
    pub fn with_max_concurrent_analyses(mut self, n: usize) -> Self {
        self.max_concurrent_analyses = n.max(1);
        self
    }

    /// Set the per-image timeout.
    pub fn with_analysis_timeout(mut self, timeout: Duration) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    /// Set the deadline for the analysis phase.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set VLM generation options.
    pub fn with_vlm_options(mut self, options: LlmOptions) -> Self {
        self.vlm_options = options;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            analyze_images: true,
            max_concurrent_analyses: 4,
            analysis_timeout: Duration::from_secs(60),
            deadline: None,
            vlm_options: LlmOptions::default(),
        }
    }
}
