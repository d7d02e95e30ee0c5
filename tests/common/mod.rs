//! Test PDF generation with lopdf.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// One text show operation at an absolute position (PDF coordinates).
pub struct TextRun {
    pub x: i64,
    pub y: i64,
    pub text: String,
}

pub fn run(x: i64, y: i64, text: &str) -> TextRun {
    TextRun {
        x,
        y,
        text: text.to_string(),
    }
}

/// Page description for [`build_document`].
#[derive(Default)]
pub struct TestPage {
    pub runs: Vec<TextRun>,
    /// Omit the font resource so string bytes are decoded as UTF-8
    pub without_font: bool,
    /// JPEG image XObjects by resource name
    pub jpeg_images: Vec<String>,
}

impl TestPage {
    pub fn text(runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    pub fn blank() -> Self {
        Self::default()
    }
}

/// Minimal JPEG (SOI + EOI markers); written to disk as-is.
pub const FAKE_JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0xFF, 0xD9];

fn page_content(runs: &[TextRun]) -> Vec<u8> {
    let mut operations = Vec::new();
    for run in runs {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
        operations.push(Operation::new("Td", vec![run.x.into(), run.y.into()]));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(run.text.as_bytes().to_vec())],
        ));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
        .encode()
        .expect("encode content stream")
}

/// Build a PDF document in memory.
pub fn build_document(pages: Vec<TestPage>, title: Option<&str>) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids = Vec::new();
    for page in &pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(&page.runs)));

        let mut resources = lopdf::Dictionary::new();
        if !page.without_font {
            resources.set("Font", dictionary! { "F1" => font_id });
        }
        if !page.jpeg_images.is_empty() {
            let mut xobjects = lopdf::Dictionary::new();
            for name in &page.jpeg_images {
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => 1,
                        "Height" => 1,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                        "Filter" => "DCTDecode",
                    },
                    FAKE_JPEG.to_vec(),
                ));
                xobjects.set(name.as_bytes().to_vec(), image_id);
            }
            resources.set("XObject", xobjects);
        }

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(title) = title {
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Author" => Object::string_literal("Research Desk"),
            "CreationDate" => Object::string_literal("D:20240115103045+09'00'"),
        });
        doc.trailer.set("Info", info_id);
    }

    doc
}

/// Build a PDF and write it under `dir`.
pub fn write_pdf(dir: &Path, name: &str, pages: Vec<TestPage>, title: Option<&str>) -> PathBuf {
    let mut doc = build_document(pages, title);
    let path = dir.join(name);
    doc.save(&path).expect("save test pdf");
    path
}

/// A two-page report: a title page and a page with a 2x3 table.
pub fn report_pages() -> Vec<TestPage> {
    vec![
        TestPage::text(vec![
            run(72, 720, "Quarterly Outlook"),
            run(72, 700, "Semiconductor demand remains strong."),
        ]),
        TestPage::text(vec![
            run(300, 720, "Coverage"),
            run(72, 600, "Analyst"),
            run(200, 600, "Rating"),
            run(72, 585, "Kim"),
            run(200, 585, "Buy"),
            run(72, 570, "Lee"),
            run(200, 570, "Hold"),
        ]),
    ]
}
