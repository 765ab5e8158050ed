use serde::{Deserialize, Serialize};

use crate::dom::layout::{style_hides, Layout, Point, Rect};
use crate::dom::selector::Selector;
use crate::error::{PageError, SelectorError};

// ============================================================================
// Node arena
// ============================================================================

/// Handle to a node inside one `Document`. Only meaningful for the document
/// that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    value: String,
}

impl ElementData {
    pub fn new(tag: &str, attrs: Vec<(String, String)>) -> Self {
        let value = attrs
            .iter()
            .find(|(k, _)| k == "value")
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        ElementData {
            tag: tag.to_ascii_lowercase(),
            attrs,
            value,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|c| c == class_name)
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// Mutable in-memory page: element tree plus the geometry measured for it.
///
/// Slots released by `remove` are recycled by later allocations, so a
/// handle to a removed node must not be used again.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: NodeId,
    layout: Layout,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            free: Vec::new(),
            root: NodeId(0),
            layout: Layout::default(),
        }
    }

    /// Parse HTML into a document that always has an `html > body` spine.
    pub fn parse(html: &str) -> Result<Self, PageError> {
        let mut doc = crate::dom::parser::parse_html(html)?;
        doc.ensure_body();
        Ok(doc)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut Layout {
        &mut self.layout
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    // ------------------------------------------------------------------
    // Tree construction
    // ------------------------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str, attrs: Vec<(String, String)>) -> NodeId {
        self.push_node(None, NodeData::Element(ElementData::new(tag, attrs)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(None, NodeData::Text(text.to_string()))
    }

    fn push_node(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let node = Node {
            parent,
            children: Vec::new(),
            data,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        };
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent.0 >= self.nodes.len() || child.0 >= self.nodes.len() || parent == child {
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Unlink a subtree from the tree. The nodes stay allocated but are no
    /// longer connected, so queries never return them.
    pub fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).and_then(|n| n.parent) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != node);
        self.nodes[node.0].parent = None;
    }

    /// Detach a subtree and release its slots and geometry for reuse.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root || node.0 >= self.nodes.len() || self.free.contains(&node) {
            return;
        }
        self.detach(node);

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let released = std::mem::replace(
                &mut self.nodes[current.0],
                Node {
                    parent: None,
                    children: Vec::new(),
                    data: NodeData::Text(String::new()),
                },
            );
            stack.extend(released.children);
            self.layout.forget(current);
            self.free.push(current);
        }
    }

    /// Allocated slots, live or not yet recycled.
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Slots currently holding a node.
    pub fn live_node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn ensure_body(&mut self) {
        if self.first_element_by_tag("body").is_some() {
            return;
        }

        let html = match self.first_element_by_tag("html") {
            Some(html) => html,
            None => {
                let html = self.create_element("html", Vec::new());
                let top: Vec<NodeId> = self.nodes[self.root.0].children.clone();
                for child in top {
                    self.append_child(html, child);
                }
                self.append_child(self.root, html);
                html
            }
        };

        let body = self.create_element("body", Vec::new());
        let content: Vec<NodeId> = self.nodes[html.0]
            .children
            .iter()
            .copied()
            .filter(|c| self.tag(*c) != Some("head"))
            .collect();
        for child in content {
            self.append_child(body, child);
        }
        self.append_child(html, body);
    }

    fn first_element_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.elements().into_iter().find(|n| self.tag(*n) == Some(tag))
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn body(&self) -> Option<NodeId> {
        self.first_element_by_tag("body")
    }

    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.node(node)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(node.0)?.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.tag())
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent
    }

    /// Parent, when it is an element (the document root is not).
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|p| self.is_element(*p))
    }

    /// Element children in document order.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|n| {
                n.children
                    .iter()
                    .copied()
                    .filter(|c| self.is_element(*c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 1-based position among the parent's element children.
    pub fn child_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent)
            .iter()
            .position(|c| *c == node)
            .map(|i| i + 1)
    }

    /// Element ancestors, nearest first, excluding `node` itself.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent_element(node);
        while let Some(current) = cursor {
            out.push(current);
            cursor = self.parent_element(current);
        }
        out
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == self.root {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Every connected element in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements(&[self.root], &mut out);
        out
    }

    /// Element descendants of `node` in document order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(n) = self.node(node) {
            self.collect_elements(&n.children, &mut out);
        }
        out
    }

    /// Pre-order walk over `starts` and their subtrees. Uses an explicit
    /// stack so nesting depth is bounded by memory, not the call stack.
    fn collect_elements(&self, starts: &[NodeId], out: &mut Vec<NodeId>) {
        let mut stack: Vec<NodeId> = starts.iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            let Some(n) = self.node(node) else {
                continue;
            };
            if matches!(n.data, NodeData::Element(_)) {
                out.push(node);
            }
            stack.extend(n.children.iter().rev().copied());
        }
    }

    // ------------------------------------------------------------------
    // Attributes, text, values
    // ------------------------------------------------------------------

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attr(name)
    }

    /// Attribute value when present and non-empty.
    pub fn non_empty_attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attr(node, name).filter(|v| !v.is_empty())
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    pub fn has_class(&self, node: NodeId, class_name: &str) -> bool {
        self.element(node).is_some_and(|e| e.has_class(class_name))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.set_attr(name, value);
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(element) = self.element_mut(node) {
            element.remove_attr(name);
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(n) = self.node(current) else {
                continue;
            };
            if let NodeData::Text(text) = &n.data {
                out.push_str(text);
            }
            stack.extend(n.children.iter().rev().copied());
        }
    }

    /// Current form value (initialised from the `value` attribute, or the
    /// text of a `textarea`).
    pub fn value(&self, node: NodeId) -> &str {
        self.element(node).map(|e| e.value.as_str()).unwrap_or("")
    }

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        if let Some(element) = self.element_mut(node) {
            element.value = value.to_string();
        }
    }

    pub(crate) fn init_textarea_values(&mut self) {
        let textareas: Vec<NodeId> = self
            .elements()
            .into_iter()
            .filter(|n| self.tag(*n) == Some("textarea"))
            .collect();
        for node in textareas {
            let text = self.text_content(node);
            self.set_value(node, &text);
        }
    }

    pub(crate) fn push_parsed_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: Vec<(String, String)>,
    ) -> NodeId {
        self.push_node(Some(parent), NodeData::Element(ElementData::new(tag, attrs)))
    }

    pub(crate) fn push_parsed_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.push_node(Some(parent), NodeData::Text(text))
    }

    // ------------------------------------------------------------------
    // Selector queries
    // ------------------------------------------------------------------

    pub fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self, node)
    }

    /// All connected elements matching `selector`, in document order.
    /// With a scope, only the scope's descendants are searched.
    pub fn select(&self, scope: Option<NodeId>, selector: &Selector) -> Vec<NodeId> {
        let candidates = match scope {
            Some(scope) => self.descendants(scope),
            None => self.elements(),
        };
        candidates
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    pub fn query_selector_all(
        &self,
        scope: Option<NodeId>,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.select(scope, &selector))
    }

    pub fn query_selector(
        &self,
        scope: Option<NodeId>,
        selector: &str,
    ) -> Result<Option<NodeId>, SelectorError> {
        Ok(self.query_selector_all(scope, selector)?.into_iter().next())
    }

    /// Nearest inclusive ancestor matching `selector`.
    pub fn closest_matching(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        std::iter::once(node)
            .filter(|n| self.is_element(*n))
            .chain(self.ancestors(node))
            .find(|n| selector.matches(self, *n))
    }

    pub fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self.closest_matching(node, &selector))
    }

    // ------------------------------------------------------------------
    // Geometry and visibility
    // ------------------------------------------------------------------

    /// Box relative to the viewport, as a fixed-position overlay needs it.
    /// Detached nodes have a zero rect.
    pub fn bounding_client_rect(&self, node: NodeId) -> Rect {
        if !self.is_connected(node) {
            return Rect::default();
        }
        let rect = self.layout.rect(node);
        if rect.is_degenerate() {
            return rect;
        }

        let window = self.layout.window_scroll();
        let (dx, dy) = self
            .ancestors(node)
            .into_iter()
            .map(|a| self.layout.element_scroll(a))
            .fold((window.x, window.y), |(x, y), s| (x + s.x, y + s.y));
        rect.translated(-dx, -dy)
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        self.layout.set_rect(node, rect);
    }

    pub fn scroll_window_to(&mut self, x: f64, y: f64) {
        self.layout.set_window_scroll(Point { x, y });
    }

    pub fn scroll_element_to(&mut self, node: NodeId, x: f64, y: f64) {
        self.layout.set_element_scroll(node, Point { x, y });
    }

    /// Hidden by attribute or inline style on the element itself.
    pub fn is_hidden_by_style(&self, node: NodeId) -> bool {
        let Some(element) = self.element(node) else {
            return true;
        };
        element.attr("hidden").is_some() || element.attr("style").is_some_and(style_hides)
    }

    /// Rendered with a non-degenerate box.
    pub fn is_visible(&self, node: NodeId) -> bool {
        !self.is_hidden_by_style(node) && !self.bounding_client_rect(node).is_degenerate()
    }
}
