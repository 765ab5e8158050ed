use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dom::document::NodeId;

// ============================================================================
// Geometry primitives
// ============================================================================

/// Axis-aligned box. Page coordinates when stored in `Layout`, viewport
/// coordinates when returned by `Document::bounding_client_rect`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }

    /// Zero width and zero height: typically a visually-hidden native control.
    pub fn is_degenerate(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Rect {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

// ============================================================================
// Layout table
// ============================================================================

/// Geometry the extractor measured for a document.
///
/// Elements without a recorded box have a zero rect. Scroll offsets are
/// tracked for the window and for individual scroll containers.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    boxes: HashMap<NodeId, Rect>,
    window_scroll: Point,
    element_scroll: HashMap<NodeId, Point>,
    viewport: Size,
    page_size: Option<Size>,
}

impl Layout {
    pub fn rect(&self, node: NodeId) -> Rect {
        self.boxes.get(&node).copied().unwrap_or_default()
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.boxes.insert(node, rect);
    }

    /// Drop every measurement recorded for `node`.
    pub fn forget(&mut self, node: NodeId) {
        self.boxes.remove(&node);
        self.element_scroll.remove(&node);
    }

    pub fn window_scroll(&self) -> Point {
        self.window_scroll
    }

    pub fn set_window_scroll(&mut self, scroll: Point) {
        self.window_scroll = scroll;
    }

    pub fn element_scroll(&self, node: NodeId) -> Point {
        self.element_scroll.get(&node).copied().unwrap_or_default()
    }

    pub fn set_element_scroll(&mut self, node: NodeId, scroll: Point) {
        self.element_scroll.insert(node, scroll);
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    pub fn set_page_size(&mut self, size: Size) {
        self.page_size = Some(size);
    }

    /// Full scrollable page size: the explicit value when the extractor sent
    /// one, otherwise the furthest box edge, never smaller than the viewport.
    pub fn page_size(&self) -> Size {
        if let Some(size) = self.page_size {
            return size;
        }

        let (width, height) = self.boxes.values().fold(
            (self.viewport.width, self.viewport.height),
            |(w, h), r| (w.max(r.x + r.width), h.max(r.y + r.height)),
        );
        Size { width, height }
    }
}

// ============================================================================
// Inline style helpers
// ============================================================================

/// Look up one property in an inline `style` attribute value.
pub fn inline_style_value(style: &str, property: &str) -> Option<String> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        if name.trim().eq_ignore_ascii_case(property) {
            Some(value.trim().to_ascii_lowercase())
        } else {
            None
        }
    })
}

/// Whether inline style alone hides the element.
pub fn style_hides(style: &str) -> bool {
    if inline_style_value(style, "display").as_deref() == Some("none") {
        return true;
    }
    if inline_style_value(style, "visibility").as_deref() == Some("hidden") {
        return true;
    }
    inline_style_value(style, "opacity")
        .and_then(|v| v.parse::<f64>().ok())
        .is_some_and(|opacity| opacity == 0.0)
}
