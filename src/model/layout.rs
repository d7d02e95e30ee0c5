//! Layout types produced by the scanner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in page-local coordinates (origin top-left).
///
/// Serialized as `[x, y, width, height]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BBox {
    /// Create a bounding box from origin and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box covering a whole page.
    pub fn page(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Tightest rectangle enclosing a set of `(x0, top, x1, bottom)` edges.
    ///
    /// Returns `None` when the iterator is empty.
    pub fn enclosing<I>(edges: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f32, f32, f32, f32)>,
    {
        let mut iter = edges.into_iter();
        let (mut x0, mut y0, mut x1, mut y1) = iter.next()?;
        for (left, top, right, bottom) in iter {
            x0 = x0.min(left);
            y0 = y0.min(top);
            x1 = x1.max(right);
            y1 = y1.max(bottom);
        }
        Some(Self::new(x0, y0, x1 - x0, y1 - y0))
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// Kind of region detected on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Text,
    Table,
    Image,
    Chart,
    Graph,
}

/// A typed region of a page with a heuristic confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutElement {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub bbox: BBox,
    pub confidence: f32,
}

impl LayoutElement {
    pub fn new(element_type: ElementType, bbox: BBox, confidence: f32) -> Self {
        Self {
            element_type,
            bbox,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Layout of one physical page (1-indexed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub page_number: u32,
    pub elements: Vec<LayoutElement>,
}

impl PageLayout {
    /// Create an empty page layout.
    pub fn new(page_number: u32) -> Self {
        Self {
            page_number,
            elements: Vec::new(),
        }
    }

    /// Elements of the given type.
    pub fn elements_of(&self, element_type: ElementType) -> impl Iterator<Item = &LayoutElement> {
        self.elements
            .iter()
            .filter(move |e| e.element_type == element_type)
    }
}

/// Document-level metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Number of pages; always equals `LayoutInfo::pages.len()`.
    pub page_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
}

/// Result of scanning a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub pages: Vec<PageLayout>,
    pub metadata: DocumentMetadata,
}

impl LayoutInfo {
    /// Get a page layout by number (1-indexed).
    pub fn page(&self, page_number: u32) -> Option<&PageLayout> {
        self.pages.iter().find(|p| p.page_number == page_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enclosing_bbox() {
        let bbox = BBox::enclosing(vec![(10.0, 10.0, 50.0, 30.0), (60.0, 20.0, 100.0, 40.0)])
            .unwrap();
        assert_eq!(bbox, BBox::new(10.0, 10.0, 90.0, 30.0));
        assert_eq!(bbox.right(), 100.0);
        assert_eq!(bbox.bottom(), 40.0);
    }

    #[test]
    fn test_enclosing_bbox_empty() {
        assert!(BBox::enclosing(Vec::new()).is_none());
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let json = serde_json::to_string(&BBox::new(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");
        let back: BBox = serde_json::from_str("[0,0,612,792]").unwrap();
        assert_eq!(back, BBox::page(612.0, 792.0));
    }

    #[test]
    fn test_layout_element_json_shape() {
        let element = LayoutElement::new(ElementType::Table, BBox::page(100.0, 200.0), 1.4);
        assert_eq!(element.confidence, 1.0);
        let value = serde_json::to_value(&element).unwrap();
        assert_eq!(value["type"], "table");
        assert_eq!(value["bbox"][3], 200.0);
    }

    #[test]
    fn test_metadata_skips_absent_fields() {
        let meta = DocumentMetadata {
            page_count: 2,
            ..Default::default()
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"pageCount":2}"#);
    }
}
