//! Per-page text, table and image extraction guided by a scanned layout.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::backend::{LopdfBackend, PdfBackend};
use crate::error::Result;
use crate::model::{
    BBox, Confidence, ExtractedImage, ExtractedTable, ExtractedText, ExtractionIssue, LayoutInfo,
    PageLayout, ParsedDocument,
};

use super::detect_language;
use super::options::{ErrorMode, ParseOptions};

/// Records produced for one page.
#[derive(Debug, Default)]
struct PageContent {
    text: Option<ExtractedText>,
    tables: Vec<ExtractedTable>,
    images: Vec<ExtractedImage>,
}

/// Extracts text, tables and images for every page of a layout.
#[derive(Debug, Clone, Default)]
pub struct DocumentParser {
    options: ParseOptions,
}

impl DocumentParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Open a PDF file and parse the pages listed in `layout`.
    pub fn parse<P: AsRef<Path>>(&self, path: P, layout: &LayoutInfo) -> Result<ParsedDocument> {
        let backend = LopdfBackend::load_file(path)?;
        self.parse_backend(&backend, layout)
    }

    /// Parse the pages listed in `layout` from an already opened document.
    ///
    /// Pages are visited in layout order. In lenient mode a failing page is
    /// recorded in [`ParsedDocument::errors`]; in strict mode the first
    /// failure is returned.
    pub fn parse_backend(
        &self,
        backend: &dyn PdfBackend,
        layout: &LayoutInfo,
    ) -> Result<ParsedDocument> {
        let results: Vec<(u32, Result<PageContent>)> = if self.options.parallel {
            layout
                .pages
                .par_iter()
                .map(|page| (page.page_number, self.parse_page(backend, page)))
                .collect()
        } else {
            layout
                .pages
                .iter()
                .map(|page| (page.page_number, self.parse_page(backend, page)))
                .collect()
        };

        let mut doc = ParsedDocument::default();
        for (page_number, result) in results {
            match result {
                Ok(content) => {
                    doc.texts.extend(content.text);
                    doc.tables.extend(content.tables);
                    doc.images.extend(content.images);
                }
                Err(e) => {
                    if self.options.error_mode == ErrorMode::Strict {
                        return Err(e);
                    }
                    log::warn!("Skipping page {}: {}", page_number, e);
                    doc.errors.push(ExtractionIssue::page(page_number, e.to_string()));
                }
            }
        }

        log::debug!(
            "Parsed {} texts, {} tables, {} images ({} page errors)",
            doc.texts.len(),
            doc.tables.len(),
            doc.images.len(),
            doc.errors.len()
        );

        Ok(doc)
    }

    fn parse_page(&self, backend: &dyn PdfBackend, page: &PageLayout) -> Result<PageContent> {
        let page_number = page.page_number;
        let size = backend.page_size(page_number)?;
        let page_box = BBox::page(size.width, size.height);
        let mut content = PageContent::default();

        let text = backend.extract_text(page_number)?;
        if !text.trim().is_empty() {
            content.text = Some(ExtractedText {
                language: detect_language(&text),
                content: text,
                page_number,
                bbox: page_box,
                confidence: Confidence::High,
            });
        }

        content.tables = backend
            .extract_tables(page_number)?
            .into_iter()
            .map(|data| ExtractedTable {
                page_number,
                data,
                bbox: page_box,
                confidence: Confidence::Medium,
            })
            .collect();

        if let Some(dir) = &self.options.image_dir {
            content.images = self.write_page_images(backend, page_number, page_box, dir)?;
        }

        Ok(content)
    }

    fn write_page_images(
        &self,
        backend: &dyn PdfBackend,
        page_number: u32,
        page_box: BBox,
        dir: &Path,
    ) -> Result<Vec<ExtractedImage>> {
        let mut images = Vec::new();
        let mut used = HashSet::new();
        for image in backend.extract_images(page_number)? {
            let Some(ext) = image.file_extension() else {
                log::debug!(
                    "Skipping image {} on page {} ({})",
                    image.name,
                    page_number,
                    image.mime_type
                );
                continue;
            };

            fs::create_dir_all(dir)?;
            let path = image_file_path(dir, page_number, &image.name, ext, &mut used);
            fs::write(&path, &image.data)?;
            images.push(ExtractedImage::new(
                page_number,
                path,
                image.mime_type.clone(),
                page_box,
            ));
        }
        Ok(images)
    }
}

/// `{dir}/page{N}_{name}.{ext}` with the resource name reduced to safe characters.
///
/// Names that collide after reduction get a `_{n}` suffix.
fn image_file_path(
    dir: &Path,
    page_number: u32,
    name: &str,
    ext: &str,
    used: &mut HashSet<String>,
) -> PathBuf {
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    let mut file_name = format!("page{}_{}.{}", page_number, stem, ext);
    let mut n = 1;
    while !used.insert(file_name.clone()) {
        n += 1;
        file_name = format!("page{}_{}_{}.{}", page_number, stem, n, ext);
    }
    dir.join(file_name)
}
