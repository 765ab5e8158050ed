use crate::dom::{Document, NodeId};
use crate::overlay::style::OVERLAY_ATTR;

/// Classes containing this substring mark a form-group-like wrapper.
const FORM_MARKER: &str = "form";
const FIELD_MARKER: &str = "field";
const LABEL_MARKER: &str = "label";

fn class_contains(doc: &Document, node: NodeId, needle: &str) -> bool {
    doc.attr(node, "class").is_some_and(|c| c.contains(needle))
}

/// Nearest inclusive ancestor satisfying `pred`.
fn closest_where<F>(doc: &Document, node: NodeId, pred: F) -> Option<NodeId>
where
    F: Fn(NodeId) -> bool,
{
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .find(|n| doc.is_element(*n) && pred(*n))
}

/// Anchor element for a scanned node's container path.
///
/// Semantic wrappers above the parent win over structural form wrappers
/// around the node; the parent is the last resort.
pub fn find_container(doc: &Document, node: NodeId) -> Option<NodeId> {
    let parent = doc.parent_element(node)?;

    for attr in ["data-name", "data-field", "data-caption"] {
        if let Some(found) = closest_where(doc, parent, |n| doc.has_attr(n, attr)) {
            return Some(found);
        }
    }

    closest_where(doc, node, |n| doc.has_class(n, "bh-form-group"))
        .or_else(|| {
            closest_where(doc, node, |n| {
                doc.tag(n) == Some("div") && class_contains(doc, n, FORM_MARKER)
            })
        })
        .or_else(|| {
            closest_where(doc, node, |n| {
                doc.tag(n) == Some("div") && class_contains(doc, n, FIELD_MARKER)
            })
        })
        .or(Some(parent))
}

fn is_label_element(doc: &Document, node: NodeId) -> bool {
    doc.has_class(node, "bh-form-label")
        || doc.tag(node) == Some("label")
        || class_contains(doc, node, LABEL_MARKER)
}

/// Trimmed text of the first label-like descendant. Empty text is no label.
pub fn container_label(doc: &Document, container: NodeId) -> Option<String> {
    let label = doc
        .descendants(container)
        .into_iter()
        .find(|n| is_label_element(doc, *n) && !is_overlay_owned(doc, *n))?;
    let text = doc.text_content(label).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Nearest form-group-like ancestor of `node` (the node itself excluded).
pub fn form_group(doc: &Document, node: NodeId) -> Option<NodeId> {
    let parent = doc.parent_element(node)?;
    closest_where(doc, parent, |n| {
        doc.has_class(n, "bh-form-group") || class_contains(doc, n, FORM_MARKER)
    })
}

/// Label of the form group around `node`, as used to verify a resolved
/// candidate.
pub fn form_group_label(doc: &Document, node: NodeId) -> Option<String> {
    form_group(doc, node).and_then(|group| container_label(doc, group))
}

/// Inside a subtree the overlay layer created.
pub fn is_overlay_owned(doc: &Document, node: NodeId) -> bool {
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .any(|n| doc.has_attr(n, OVERLAY_ATTR))
}
