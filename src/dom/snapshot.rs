use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dom::document::Document;
use crate::dom::layout::{Point, Rect, Size};
use crate::error::PageError;

/// Measured box for the element at `node` (index in document order).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutBox {
    pub node: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementScroll {
    pub node: usize,
    pub x: f64,
    pub y: f64,
}

/// Wire form of a captured page, as sent by the browser-side extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub html: String,
    #[serde(default)]
    pub viewport: Size,
    #[serde(default)]
    pub scroll: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<Size>,
    #[serde(default)]
    pub layout: Vec<LayoutBox>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub element_scroll: Vec<ElementScroll>,
}

impl PageSnapshot {
    pub fn from_json(json: &str) -> Result<Self, PageError> {
        serde_json::from_str(json).map_err(|source| PageError::JsonParse {
            context: "page snapshot".into(),
            source,
        })
    }

    /// Load a snapshot file. Plain `.html` files become a snapshot with no
    /// measured layout.
    pub fn load(path: &Path) -> Result<Self, PageError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PageError::HtmlParse(format!("{}: {}", path.display(), e)))?;

        let is_html = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
        if is_html {
            return Ok(PageSnapshot {
                url: format!("file://{}", path.display()),
                html: content,
                ..Default::default()
            });
        }
        Self::from_json(&content)
    }

    /// Build the live document. Layout entries pointing past the last element
    /// are ignored.
    pub fn into_document(self) -> Result<Document, PageError> {
        let mut doc = Document::parse(&self.html)?;
        let elements = doc.elements();

        let layout = doc.layout_mut();
        layout.set_viewport(self.viewport);
        layout.set_window_scroll(self.scroll);
        if let Some(size) = self.page_size {
            layout.set_page_size(size);
        }

        for entry in &self.layout {
            if let Some(node) = elements.get(entry.node) {
                layout.set_rect(*node, Rect::new(entry.x, entry.y, entry.width, entry.height));
            }
        }
        for entry in &self.element_scroll {
            if let Some(node) = elements.get(entry.node) {
                layout.set_element_scroll(*node, Point { x: entry.x, y: entry.y });
            }
        }

        tracing::debug!(
            url = %self.url,
            elements = elements.len(),
            boxes = self.layout.len(),
            "Loaded page snapshot"
        );
        Ok(doc)
    }
}
