//! Integration tests for the scan → parse → analyze pipeline.

mod common;

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use common::{report_pages, run, write_pdf, TestPage, FAKE_JPEG};
use docextract::llm::ImageInput;
use docextract::{
    AdapterRegistry, Capabilities, Confidence, DocumentExtractor, DocumentParser,
    DocumentScanner, ElementType, Error, ExtractOptions, IssueKind, Language, LlmAdapter,
    LlmOptions, LlmResponse, LlmRouter, ParseOptions, ProviderKind, Result, VlmImageAnalyzer,
};

/// Multimodal stub: fails on images whose file name contains "fail",
/// stalls on "slow", otherwise answers with a fixed bar-chart analysis.
struct StubVision {
    calls: AtomicUsize,
}

impl StubVision {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LlmAdapter for StubVision {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            embed: false,
            vision: true,
        }
    }

    async fn generate(&self, _prompt: &str, _options: &LlmOptions) -> Result<LlmResponse> {
        Err(Error::provider(ProviderKind::Gemini, "text-only call not expected"))
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        image: &ImageInput,
        _options: &LlmOptions,
    ) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!image.data.is_empty());

        if prompt.contains("fail") {
            return Err(Error::Provider {
                provider: ProviderKind::Gemini,
                status: Some(500),
                message: "internal error".to_string(),
            });
        }
        if prompt.contains("slow") {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }

        Ok(LlmResponse {
            content: r#"{"chartType": "bar", "data": [12.5, 14.1], "text": "Revenue", "confidence": 0.8}"#
                .to_string(),
            ..Default::default()
        })
    }
}

/// Multimodal stub that answers with the image label after a per-label delay,
/// recording the order in which answers complete.
struct DelayedVision {
    delays: Vec<(&'static str, u64)>,
    completed: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmAdapter for DelayedVision {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            embed: false,
            vision: true,
        }
    }

    async fn generate(&self, _prompt: &str, _options: &LlmOptions) -> Result<LlmResponse> {
        Err(Error::provider(ProviderKind::Gemini, "text-only call not expected"))
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        _image: &ImageInput,
        _options: &LlmOptions,
    ) -> Result<LlmResponse> {
        // "Analyze this {label} chart ..."
        let label = prompt.split_whitespace().nth(2).unwrap_or_default().to_string();
        let delay = self
            .delays
            .iter()
            .find(|(name, _)| *name == label)
            .map_or(0, |(_, ms)| *ms);
        tokio::time::sleep(Duration::from_millis(delay)).await;

        self.completed.lock().unwrap().push(label.clone());
        Ok(LlmResponse {
            content: serde_json::json!({"text": label, "confidence": 0.9}).to_string(),
            ..Default::default()
        })
    }
}

fn router_with(adapter: Arc<dyn LlmAdapter>) -> LlmRouter {
    let mut registry = AdapterRegistry::new();
    registry.register(adapter);
    LlmRouter::new(registry)
}

/// Writes one fake JPEG per label and returns image records whose
/// `image_type` carries the label, so the stub can see it in the prompt.
fn image_records(dir: &Path, labels: &[&str]) -> Vec<docextract::ExtractedImage> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let path = dir.join(format!("page{}_{}.jpg", i + 1, label));
            std::fs::write(&path, FAKE_JPEG).unwrap();
            docextract::ExtractedImage::new(
                (i + 1) as u32,
                path,
                format!("{} chart", label),
                docextract::BBox::page(612.0, 792.0),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_extract_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path(), "report.pdf", report_pages(), Some("Q3 Outlook"));

    let result = DocumentExtractor::new().extract(&path).await.unwrap();

    assert_eq!(result.metadata.page_count, 2);
    assert_eq!(result.metadata.title.as_deref(), Some("Q3 Outlook"));
    assert_eq!(result.metadata.author.as_deref(), Some("Research Desk"));
    assert!(result.metadata.creation_date.is_some());

    assert_eq!(result.texts.len(), 2);
    let first = &result.texts[0];
    assert_eq!(first.page_number, 1);
    assert_eq!(first.language, Language::En);
    assert_eq!(first.confidence, Confidence::High);
    assert!(first.content.contains("Quarterly Outlook"));
    assert!(first.content.contains("Semiconductor demand"));

    assert_eq!(result.tables.len(), 1);
    let table = &result.tables[0];
    assert_eq!(table.page_number, 2);
    assert_eq!(
        table.data,
        vec![
            vec!["Analyst", "Rating"],
            vec!["Kim", "Buy"],
            vec!["Lee", "Hold"],
        ]
    );

    assert!(result.images.is_empty());
    assert!(result.is_complete());
}

#[test]
fn test_scan_layout() {
    let dir = tempfile::tempdir().unwrap();
    let mut pages = report_pages();
    pages.push(TestPage::blank());
    let path = write_pdf(dir.path(), "report.pdf", pages, None);

    let layout = DocumentScanner::new().scan(&path).unwrap();
    assert_eq!(layout.pages.len(), 3);
    assert_eq!(layout.metadata.page_count, 3);
    assert!(layout.metadata.title.is_none());

    let page1 = layout.page(1).unwrap();
    let text: Vec<_> = page1.elements_of(ElementType::Text).collect();
    assert_eq!(text.len(), 1);
    assert_eq!(text[0].confidence, 0.9);
    assert_eq!(text[0].bbox.x, 72.0);
    assert!(text[0].bbox.y > 0.0 && text[0].bbox.bottom() < 792.0);
    assert_eq!(page1.elements_of(ElementType::Table).count(), 0);

    let page2 = layout.page(2).unwrap();
    let tables: Vec<_> = page2.elements_of(ElementType::Table).collect();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].bbox, docextract::BBox::page(612.0, 792.0));
    assert_eq!(tables[0].confidence, 0.8);

    assert!(layout.page(3).unwrap().elements.is_empty());
}

#[test]
fn test_blank_page_has_no_text() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![TestPage::blank(), TestPage::text(vec![run(72, 700, "Summary")])];
    let path = write_pdf(dir.path(), "blank.pdf", pages, None);

    let parsed = docextract::parse_file(&path).unwrap();
    assert_eq!(parsed.texts.len(), 1);
    assert_eq!(parsed.texts[0].page_number, 2);
}

#[test]
fn test_korean_text_tagged_ko() {
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![TestPage {
        runs: vec![run(72, 700, "안녕하세요 Report")],
        without_font: true,
        ..Default::default()
    }];
    let path = write_pdf(dir.path(), "ko.pdf", pages, None);

    let parsed = docextract::parse_file(&path).unwrap();
    assert_eq!(parsed.texts.len(), 1);
    assert_eq!(parsed.texts[0].content, "안녕하세요 Report");
    assert_eq!(parsed.texts[0].language, Language::Ko);
}

#[tokio::test]
async fn test_zero_page_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path(), "empty.pdf", Vec::new(), None);

    let result = DocumentExtractor::new().extract(&path).await.unwrap();
    assert!(result.texts.is_empty());
    assert!(result.tables.is_empty());
    assert!(result.images.is_empty());
    assert_eq!(result.metadata.page_count, 0);
}

#[tokio::test]
async fn test_unreadable_document() {
    let dir = tempfile::tempdir().unwrap();

    let not_pdf = dir.path().join("notes.pdf");
    std::fs::write(&not_pdf, "just some notes").unwrap();
    let err = DocumentExtractor::new().extract(&not_pdf).await.unwrap_err();
    assert!(matches!(err, Error::DocumentUnreadable(_)));

    let truncated = dir.path().join("truncated.pdf");
    std::fs::write(&truncated, "%PDF-1.4\n1 0 obj\n<< /Type /Catalog").unwrap();
    let err = DocumentExtractor::new().extract(&truncated).await.unwrap_err();
    assert!(matches!(err, Error::DocumentUnreadable(_)));

    let missing = dir.path().join("missing.pdf");
    let err = DocumentScanner::new().scan(&missing).unwrap_err();
    assert!(matches!(err, Error::DocumentUnreadable(_)));
}

#[tokio::test]
async fn test_extract_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(dir.path(), "report.pdf", report_pages(), Some("Q3 Outlook"));
    let extractor = DocumentExtractor::new();

    let a = extractor.extract(&path).await.unwrap();
    let b = extractor.extract(&path).await.unwrap();
    assert_eq!(a.texts, b.texts);
    assert_eq!(a.tables, b.tables);
    assert_eq!(a.metadata, b.metadata);
}

#[test]
fn test_parse_order_matches_layout() {
    let dir = tempfile::tempdir().unwrap();
    let pages = (1..=6)
        .map(|i| TestPage::text(vec![run(72, 700, &format!("Section {}", i))]))
        .collect();
    let path = write_pdf(dir.path(), "sections.pdf", pages, None);

    let layout = DocumentScanner::new().scan(&path).unwrap();
    let parsed = DocumentParser::new().parse(&path, &layout).unwrap();
    let order: Vec<u32> = parsed.texts.iter().map(|t| t.page_number).collect();
    assert_eq!(order, vec![1, 2, 3, 4, 5, 6]);

    let sequential = DocumentParser::with_options(ParseOptions::new().sequential())
        .parse(&path, &layout)
        .unwrap();
    assert_eq!(parsed, sequential);
}

#[tokio::test]
async fn test_embedded_images_analyzed() {
    let dir = tempfile::tempdir().unwrap();
    let image_dir = dir.path().join("images");
    let pages = vec![TestPage {
        runs: vec![run(72, 700, "Revenue by segment")],
        jpeg_images: vec!["Im1".to_string()],
        ..Default::default()
    }];
    let path = write_pdf(dir.path(), "chart.pdf", pages, None);

    let stub = StubVision::new();
    let options =
        ExtractOptions::new().with_parse_options(ParseOptions::new().with_image_dir(image_dir.clone()));
    let extractor = DocumentExtractor::with_options(options)
        .with_analyzer(VlmImageAnalyzer::new(router_with(stub.clone())));

    let result = extractor.extract(&path).await.unwrap();
    assert_eq!(result.images.len(), 1);

    let image = &result.images[0];
    assert_eq!(image.image_path, image_dir.join("page1_Im1.jpg"));
    assert_eq!(std::fs::read(&image.image_path).unwrap(), FAKE_JPEG);
    assert_eq!(image.image_type, "image/jpeg");

    let analysis = image.analysis_result.as_ref().unwrap();
    assert_eq!(analysis.chart_type.as_deref(), Some("bar"));
    assert_eq!(analysis.text.as_deref(), Some("Revenue"));
    assert_eq!(analysis.confidence, 0.8);
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_partial_image_failure() {
    let dir = tempfile::tempdir().unwrap();
    let images = image_records(dir.path(), &["revenue", "fail", "margin"]);

    let extractor =
        DocumentExtractor::new().with_analyzer(VlmImageAnalyzer::new(router_with(StubVision::new())));
    let (images, errors) = extractor.annotate_images(images).await;

    assert_eq!(images.len(), 3);
    assert!(images[0].analysis_result.is_some());
    assert!(images[1].analysis_result.is_none());
    assert!(images[2].analysis_result.is_some());

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, IssueKind::ImageAnalysis);
    assert_eq!(errors[0].page_number, 2);
    assert!(errors[0].message.contains("HTTP 500"));
}

#[tokio::test]
async fn test_missing_multimodal_adapter_degrades_images() {
    let dir = tempfile::tempdir().unwrap();
    let images = image_records(dir.path(), &["revenue", "margin"]);

    let extractor = DocumentExtractor::new()
        .with_analyzer(VlmImageAnalyzer::new(LlmRouter::new(AdapterRegistry::new())));
    let (images, errors) = extractor.annotate_images(images).await;

    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|i| i.analysis_result.is_none()));
    assert_eq!(errors.len(), 2);
    assert!(errors[0].message.contains("gemini"));
}

#[tokio::test]
async fn test_analysis_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let images = image_records(dir.path(), &["revenue", "slow"]);

    let options = ExtractOptions::new().with_analysis_timeout(Duration::from_millis(500));
    let extractor = DocumentExtractor::with_options(options)
        .with_analyzer(VlmImageAnalyzer::new(router_with(StubVision::new())));
    let (images, errors) = extractor.annotate_images(images).await;

    assert!(images[0].analysis_result.is_some());
    assert!(images[1].analysis_result.is_none());
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("timed out"));
}

#[tokio::test]
async fn test_analysis_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let images = image_records(dir.path(), &["revenue"]);
    let stub = StubVision::new();

    let options = ExtractOptions::new().with_image_analysis(false);
    let extractor = DocumentExtractor::with_options(options)
        .with_analyzer(VlmImageAnalyzer::new(router_with(stub.clone())));
    let (images, errors) = extractor.annotate_images(images).await;

    assert!(images[0].analysis_result.is_none());
    assert!(errors.is_empty());
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_results_keep_input_order_when_completed_out_of_order() {
    let dir = tempfile::tempdir().unwrap();
    let images = image_records(dir.path(), &["alpha", "beta", "gamma"]);
    let stub = Arc::new(DelayedVision {
        delays: vec![("alpha", 300), ("beta", 150), ("gamma", 0)],
        completed: Mutex::new(Vec::new()),
    });

    let options = ExtractOptions::new().with_max_concurrent_analyses(3);
    let extractor = DocumentExtractor::with_options(options)
        .with_analyzer(VlmImageAnalyzer::new(router_with(stub.clone())));
    let (images, errors) = extractor.annotate_images(images).await;

    assert!(errors.is_empty());
    assert_eq!(*stub.completed.lock().unwrap(), vec!["gamma", "beta", "alpha"]);

    let texts: Vec<_> = images
        .iter()
        .map(|image| image.analysis_result.as_ref().and_then(|r| r.text.clone()))
        .collect();
    assert_eq!(
        texts,
        vec![Some("alpha".to_string()), Some("beta".to_string()), Some("gamma".to_string())]
    );
    let pages: Vec<_> = images.iter().map(|image| image.page_number).collect();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_deadline_bounds_slow_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let images = image_records(dir.path(), &["revenue", "slow", "margin"]);

    let options = ExtractOptions::new()
        .with_analysis_timeout(Duration::from_secs(60))
        .with_deadline(Duration::from_millis(500));
    let extractor = DocumentExtractor::with_options(options)
        .with_analyzer(VlmImageAnalyzer::new(router_with(StubVision::new())));

    let started = Instant::now();
    let (images, errors) = extractor.annotate_images(images).await;
    assert!(started.elapsed() < Duration::from_secs(5));

    let annotated: Vec<_> = images.iter().map(|i| i.analysis_result.is_some()).collect();
    assert_eq!(annotated, vec![true, false, true]);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, IssueKind::ImageAnalysis);
    assert_eq!(errors[0].page_number, 2);
    assert!(errors[0].message.contains("timed out"));
}
