//! [`PdfBackend`] implementation backed by `lopdf`.

use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::detect::detect_format_from_path;
use crate::error::{Error, Result};
use crate::model::DocumentMetadata;

use super::content::{extract_spans, group_spans_into_lines, spans_to_words, TextSpan};
use super::tables::TableDetector;
use super::{EmbeddedImage, PageSize, PdfBackend, TableGrid, Word};

/// Depth limit when walking the page tree for inherited attributes.
const MAX_TREE_DEPTH: usize = 32;

/// A PDF document loaded with `lopdf`.
pub struct LopdfBackend {
    doc: LopdfDocument,
    pages: Vec<ObjectId>,
    tables: TableDetector,
}

impl LopdfBackend {
    /// Load from a file path.
    ///
    /// Any failure (missing file, wrong format, broken cross-reference table)
    /// is reported as [`Error::DocumentUnreadable`].
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        detect_format_from_path(path)?;
        let doc = LopdfDocument::load(path)
            .map_err(|e| Error::DocumentUnreadable(format!("{}: {}", path.display(), e)))?;
        log::debug!("Loaded {} (PDF {})", path.display(), doc.version);
        Ok(Self::from_document(doc))
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        crate::detect::detect_format_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self::from_document(doc))
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        let pages = doc.get_pages().into_values().collect();
        Self {
            doc,
            pages,
            tables: TableDetector::new(),
        }
    }

    /// Replace the table detector.
    pub fn with_table_detector(mut self, detector: TableDetector) -> Self {
        self.tables = detector;
        self
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .copied()
            .ok_or(Error::PageOutOfRange(page, self.pages.len() as u32))
    }

    /// Look up a page attribute, following `Parent` links for inherited keys.
    fn inherited<'a>(&'a self, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
        let mut dict = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            _ => obj,
        }
    }

    fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.resolve(obj) {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Decompressed content stream of a page. A page without `Contents` is blank.
    fn page_content(&self, page: u32, page_id: ObjectId) -> Result<Vec<u8>> {
        let page_dict = self.doc.get_dictionary(page_id).map_err(|e| Error::PageParse {
            page,
            message: e.to_string(),
        })?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => self.resolve(contents),
            Err(_) => return Ok(Vec::new()),
        };

        let streams: Vec<&Object> = match contents {
            Object::Array(items) => items.iter().map(|o| self.resolve(o)).collect(),
            other => vec![other],
        };

        let mut content = Vec::new();
        for obj in streams {
            let Object::Stream(stream) = obj else {
                return Err(Error::PageParse {
                    page,
                    message: "invalid content stream".to_string(),
                });
            };
            // Unfiltered streams are stored as-is
            if stream.dict.get(b"Filter").is_err() {
                content.extend_from_slice(&stream.content);
            } else {
                let data = stream.decompressed_content().map_err(|e| Error::PageParse {
                    page,
                    message: format!("content stream: {}", e),
                })?;
                content.extend_from_slice(&data);
            }
            content.push(b'\n');
        }
        Ok(content)
    }

    /// Text spans of a page in PDF user space.
    pub fn page_spans(&self, page: u32) -> Result<Vec<TextSpan>> {
        let page_id = self.page_id(page)?;
        let content = self.page_content(page, page_id)?;
        if content.is_empty() {
            return Ok(Vec::new());
        }
        let fonts = self.doc.get_page_fonts(page_id).map_err(|e| Error::PageParse {
            page,
            message: format!("fonts: {}", e),
        })?;
        extract_spans(&self.doc, page, &content, &fonts)
    }

    fn info_string(&self, info: &Dictionary, key: &[u8]) -> Option<String> {
        match self.resolve(info.get(key).ok()?) {
            Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
            Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
            _ => None,
        }
        .filter(|s| !s.trim().is_empty())
    }

    fn extract_xobject_image(&self, name: &[u8], obj: &Object) -> Option<EmbeddedImage> {
        let Object::Stream(stream) = self.resolve(obj) else {
            return None;
        };
        let dict = &stream.dict;
        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let int = |key: &[u8]| {
            dict.get(key)
                .ok()
                .and_then(|v| v.as_i64().ok())
                .and_then(|v| u32::try_from(v).ok())
        };

        // The last filter in a chain determines the stored encoding
        let filter = match dict.get(b"Filter").ok().map(|f| self.resolve(f)) {
            Some(Object::Name(n)) => n.clone(),
            Some(Object::Array(items)) => items
                .last()
                .and_then(|f| f.as_name().ok())
                .map(|n| n.to_vec())
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        let mime_type = match filter.as_slice() {
            b"DCTDecode" => "image/jpeg",
            b"JPXDecode" => "image/jp2",
            _ => "application/octet-stream",
        };

        Some(EmbeddedImage {
            name: String::from_utf8_lossy(name).to_string(),
            mime_type: mime_type.to_string(),
            data: stream.content.clone(),
            width: int(b"Width"),
            height: int(b"Height"),
        })
    }
}

impl PdfBackend for LopdfBackend {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn metadata(&self) -> DocumentMetadata {
        let mut metadata = DocumentMetadata {
            page_count: self.page_count(),
            ..Default::default()
        };

        let info = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| self.resolve_dict(info));

        if let Some(info) = info {
            metadata.title = self.info_string(info, b"Title");
            metadata.author = self.info_string(info, b"Author");
            metadata.creation_date = self
                .info_string(info, b"CreationDate")
                .and_then(|s| parse_pdf_date(&s));
        }

        metadata
    }

    fn page_size(&self, page: u32) -> Result<PageSize> {
        let page_id = self.page_id(page)?;
        let media_box = self
            .inherited(page_id, b"MediaBox")
            .and_then(|b| b.as_array().ok())
            .filter(|b| b.len() >= 4);

        let Some(media_box) = media_box else {
            return Ok(PageSize::letter());
        };

        let n: Vec<f32> = media_box
            .iter()
            .take(4)
            .map(|v| match self.resolve(v) {
                Object::Integer(i) => *i as f32,
                Object::Real(r) => *r,
                _ => 0.0,
            })
            .collect();
        let (width, height) = ((n[2] - n[0]).abs(), (n[3] - n[1]).abs());

        if width > 0.0 && height > 0.0 {
            Ok(PageSize::new(width, height))
        } else {
            Ok(PageSize::letter())
        }
    }

    fn extract_words(&self, page: u32) -> Result<Vec<Word>> {
        let size = self.page_size(page)?;
        let spans = self.page_spans(page)?;
        Ok(spans_to_words(&spans, size.height))
    }

    fn extract_text(&self, page: u32) -> Result<String> {
        let spans = self.page_spans(page)?;
        let text = group_spans_into_lines(spans)
            .iter()
            .map(|line| line.text())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(text)
    }

    fn extract_tables(&self, page: u32) -> Result<Vec<TableGrid>> {
        let spans = self.page_spans(page)?;
        Ok(self
            .tables
            .detect(&spans)
            .iter()
            .map(|table| table.to_grid())
            .collect())
    }

    fn extract_images(&self, page: u32) -> Result<Vec<EmbeddedImage>> {
        let page_id = self.page_id(page)?;
        let xobjects = self
            .inherited(page_id, b"Resources")
            .and_then(|r| self.resolve_dict(r))
            .and_then(|r| r.get(b"XObject").ok())
            .and_then(|x| self.resolve_dict(x));

        let Some(xobjects) = xobjects else {
            return Ok(Vec::new());
        };

        Ok(xobjects
            .iter()
            .filter_map(|(name, obj)| self.extract_xobject_image(name, obj))
            .collect())
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, else UTF-8 or Latin-1).
fn decode_pdf_string(bytes: &[u8]) -> String {
    super::content::decode_text_simple(bytes)
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSS...`). Timezone suffixes are ignored.
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);
    let year: i32 = s.get(0..4)?.parse().ok()?;
    let field = |range: std::ops::Range<usize>, default: u32| {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };

    chrono::NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1))
        .and_then(|date| date.and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0)))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}
