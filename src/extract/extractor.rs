//! Scan, parse and analyze a document in one call.

use std::path::Path;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;

use crate::backend::{LopdfBackend, PdfBackend};
use crate::error::{Error, Result};
use crate::llm::LlmOptions;
use crate::model::{
    ExtractedImage, ExtractionIssue, ExtractionResult, LayoutInfo, ParsedDocument,
};

use super::options::ExtractOptions;
use super::parser::DocumentParser;
use super::scanner::DocumentScanner;
use super::vlm::VlmImageAnalyzer;

/// Runs scanner, parser and image analysis over a document.
#[derive(Clone)]
pub struct DocumentExtractor {
    scanner: DocumentScanner,
    parser: DocumentParser,
    analyzer: Option<VlmImageAnalyzer>,
    options: ExtractOptions,
}

impl DocumentExtractor {
    /// Extractor without image analysis.
    pub fn new() -> Self {
        Self::with_options(ExtractOptions::default())
    }

    pub fn with_options(options: ExtractOptions) -> Self {
        Self {
            scanner: DocumentScanner::new(),
            parser: DocumentParser::with_options(options.parse.clone()),
            analyzer: None,
            options,
        }
    }

    /// Attach the image analyzer used for extracted images.
    ///
    /// Non-default [`ExtractOptions::vlm_options`] replace the analyzer's own
    /// options; default ones leave them untouched.
    pub fn with_analyzer(mut self, analyzer: VlmImageAnalyzer) -> Self {
        let analyzer = if self.options.vlm_options == LlmOptions::default() {
            analyzer
        } else {
            analyzer.with_options(self.options.vlm_options.clone())
        };
        self.analyzer = Some(analyzer);
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract a PDF file.
    ///
    /// The document is opened once; scanning and parsing run on the blocking
    /// thread pool, image analyses run concurrently afterwards.
    pub async fn extract<P: AsRef<Path>>(&self, path: P) -> Result<ExtractionResult> {
        let path = path.as_ref().to_path_buf();
        log::info!("Extracting {}", path.display());

        let scanner = self.scanner.clone();
        let parser = self.parser.clone();
        let (layout, parsed) = tokio::task::spawn_blocking(move || {
            let backend = LopdfBackend::load_file(&path)?;
            let layout = scanner.scan_backend(&backend)?;
            let parsed = parser.parse_backend(&backend, &layout)?;
            Ok::<_, Error>((layout, parsed))
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;

        Ok(self.assemble(layout, parsed).await)
    }

    /// Extract from an already opened document.
    pub async fn extract_backend(&self, backend: &dyn PdfBackend) -> Result<ExtractionResult> {
        let layout = self.scanner.scan_backend(backend)?;
        let parsed = self.parser.parse_backend(backend, &layout)?;
        Ok(self.assemble(layout, parsed).await)
    }

    async fn assemble(&self, layout: LayoutInfo, parsed: ParsedDocument) -> ExtractionResult {
        let ParsedDocument {
            texts,
            tables,
            images,
            mut errors,
        } = parsed;

        let (images, image_errors) = self.annotate_images(images).await;
        errors.extend(image_errors);

        ExtractionResult {
            texts,
            tables,
            images,
            metadata: layout.metadata,
            errors,
        }
    }

    /// Analyze every image concurrently and merge the results in input order.
    ///
    /// A failed or timed-out analysis leaves that image unannotated and adds an
    /// issue; the other images are unaffected.
    pub async fn annotate_images(
        &self,
        images: Vec<ExtractedImage>,
    ) -> (Vec<ExtractedImage>, Vec<ExtractionIssue>) {
        let analyzer = match &self.analyzer {
            Some(analyzer) if self.options.analyze_images && !images.is_empty() => analyzer,
            _ => return (images, Vec::new()),
        };

        let timeout = self.options.analysis_timeout;
        let deadline = self.options.deadline.map(|d| Instant::now() + d);

        let outcomes: Vec<Result<_>> = stream::iter(images.iter())
            .map(|image| async move {
                let budget = match deadline {
                    Some(deadline) => timeout.min(deadline.saturating_duration_since(Instant::now())),
                    None => timeout,
                };
                let analysis = analyzer.analyze(&image.image_path, &image.image_type);
                tokio::time::timeout(budget, analysis)
                    .await
                    .unwrap_or(Err(Error::Timeout(budget)))
            })
            .buffered(self.options.max_concurrent_analyses.max(1))
            .collect()
            .await;

        let mut errors = Vec::new();
        let images = images
            .into_iter()
            .zip(outcomes)
            .map(|(mut image, outcome)| {
                match outcome {
                    Ok(result) => image.analysis_result = Some(result),
                    Err(e) => {
                        log::warn!("Image analysis failed for {}: {}", image.image_path.display(), e);
                        errors.push(ExtractionIssue::image(&image, e.to_string()));
                    }
                }
                image
            })
            .collect();

        (images, errors)
    }
}

impl Default for DocumentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::testing::{FakeBackend, FakePage};

    #[tokio::test]
    async fn test_extract_backend_without_analyzer() {
        let backend = FakeBackend::new(vec![
            FakePage::text("Quarterly Outlook").with_table(vec![vec!["a", "b"], vec!["1", "2"]]),
            FakePage::blank(),
        ]);

        let result = DocumentExtractor::new().extract_backend(&backend).await.unwrap();
        assert_eq!(result.metadata.page_count, 2);
        assert_eq!(result.texts.len(), 1);
        assert_eq!(result.tables.len(), 1);
        assert!(result.images.is_empty());
        assert!(result.is_complete());
    }

    #[tokio::test]
    async fn test_images_pass_through_without_analyzer() {
        let images = vec![ExtractedImage::new(
            1,
            "page1_Im1.jpg",
            "image/jpeg",
            crate::model::BBox::page(612.0, 792.0),
        )];
        let (images, errors) = DocumentExtractor::new().annotate_images(images).await;
        assert_eq!(images.len(), 1);
        assert!(images[0].analysis_result.is_none());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_analyzer_options_kept_without_override() {
        let router = crate::llm::LlmRouter::new(crate::llm::AdapterRegistry::new());
        let own = LlmOptions::new().with_temperature(0.1);

        let extractor = DocumentExtractor::new()
            .with_analyzer(VlmImageAnalyzer::new(router.clone()).with_options(own.clone()));
        assert_eq!(extractor.analyzer.as_ref().map(|a| a.options()), Some(&own));

        let custom = LlmOptions::new().with_max_tokens(512);
        let extractor =
            DocumentExtractor::with_options(ExtractOptions::new().with_vlm_options(custom.clone()))
                .with_analyzer(VlmImageAnalyzer::new(router).with_options(own));
        assert_eq!(extractor.analyzer.as_ref().map(|a| a.options()), Some(&custom));
    }
}
