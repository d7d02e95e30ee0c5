//! Layout analysis: typed page regions with bounding boxes.

use std::path::Path;

use crate::backend::{LopdfBackend, PdfBackend};
use crate::error::Result;
use crate::model::{BBox, ElementType, LayoutElement, LayoutInfo, PageLayout};

/// Heuristic confidence for the text region of a page.
pub const TEXT_CONFIDENCE: f32 = 0.9;

/// Heuristic confidence for detected tables.
pub const TABLE_CONFIDENCE: f32 = 0.8;

/// Produces a [`LayoutInfo`] from a PDF.
#[derive(Debug, Clone, Default)]
pub struct DocumentScanner;

impl DocumentScanner {
    pub fn new() -> Self {
        Self
    }

    /// Open and scan a PDF file.
    pub fn scan<P: AsRef<Path>>(&self, path: P) -> Result<LayoutInfo> {
        let backend = LopdfBackend::load_file(path)?;
        self.scan_backend(&backend)
    }

    /// Scan an already opened document.
    ///
    /// Pages whose content cannot be read get an empty element list; the
    /// parser reports the failure for that page.
    pub fn scan_backend(&self, backend: &dyn PdfBackend) -> Result<LayoutInfo> {
        let metadata = backend.metadata();
        let pages = (1..=backend.page_count())
            .map(|page_number| {
                self.scan_page(backend, page_number).unwrap_or_else(|e| {
                    log::warn!("Layout analysis failed on page {}: {}", page_number, e);
                    PageLayout::new(page_number)
                })
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Scanned {} pages, {} elements",
            pages.len(),
            pages.iter().map(|p| p.elements.len()).sum::<usize>()
        );

        Ok(LayoutInfo { pages, metadata })
    }

    fn scan_page(&self, backend: &dyn PdfBackend, page_number: u32) -> Result<PageLayout> {
        let mut layout = PageLayout::new(page_number);
        let size = backend.page_size(page_number)?;

        let words = backend.extract_words(page_number)?;
        if let Some(bbox) = BBox::enclosing(words.iter().map(|w| w.edges())) {
            layout
                .elements
                .push(LayoutElement::new(ElementType::Text, bbox, TEXT_CONFIDENCE));
        }

        // Table regions are not located precisely; each table covers the page
        let page_box = BBox::page(size.width, size.height);
        for _ in backend.extract_tables(page_number)? {
            layout
                .elements
                .push(LayoutElement::new(ElementType::Table, page_box, TABLE_CONFIDENCE));
        }

        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::testing::{FakeBackend, FakePage};

    #[test]
    fn test_scan_text_and_table_elements() {
        let backend = FakeBackend::new(vec![
            FakePage::text("Target price").with_table(vec![vec!["PER", "12.3"]])
        ]);
        let layout = DocumentScanner::new().scan_backend(&backend).unwrap();

        assert_eq!(layout.pages.len(), 1);
        let page = &layout.pages[0];
        assert_eq!(page.page_number, 1);

        let text: Vec<_> = page.elements_of(ElementType::Text).collect();
        assert_eq!(text.len(), 1);
        assert_eq!(text[0].confidence, TEXT_CONFIDENCE);
        // "Target" spans 72..108, "price" 111..141
        assert_eq!(text[0].bbox, BBox::new(72.0, 100.0, 69.0, 12.0));

        let tables: Vec<_> = page.elements_of(ElementType::Table).collect();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].bbox, BBox::page(612.0, 792.0));
        assert_eq!(tables[0].confidence, TABLE_CONFIDENCE);
    }

    #[test]
    fn test_blank_and_broken_pages_have_no_elements() {
        let backend = FakeBackend::new(vec![FakePage::blank(), FakePage::broken()]);
        let layout = DocumentScanner::new().scan_backend(&backend).unwrap();

        assert_eq!(layout.pages.len(), 2);
        assert_eq!(layout.metadata.page_count, 2);
        assert!(layout.pages.iter().all(|p| p.elements.is_empty()));
    }

    #[test]
    fn test_empty_document() {
        let layout = DocumentScanner::new()
            .scan_backend(&FakeBackend::new(Vec::new()))
            .unwrap();
        assert!(layout.pages.is_empty());
        assert_eq!(layout.metadata.page_count, 0);
    }
}
