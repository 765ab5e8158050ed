use crate::dom::{Document, NodeId};
use crate::screen::descriptor::ElementType;

/// Attributes that turn an anchor into an action trigger.
const ACTION_ATTRIBUTES: &[&str] = &["data-action"];

/// Semantic name attribute carried by display elements.
pub const NAME_ATTRIBUTE: &str = "data-name";

/// Assign exactly one capability tag. Rules are checked in priority order
/// and the first match wins.
pub fn classify(doc: &Document, node: NodeId) -> ElementType {
    if is_button_like(doc, node) {
        return ElementType::Button;
    }
    if is_text_entry(doc, node) {
        return ElementType::Input;
    }
    if is_select_display(doc, node) {
        return ElementType::SelectDisplay;
    }
    ElementType::TextDisplay
}

fn input_type(doc: &Document, node: NodeId) -> String {
    doc.attr(node, "type")
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "text".to_string())
}

/// Native button, button-typed input, or an anchor marked as a button.
pub fn is_button_like(doc: &Document, node: NodeId) -> bool {
    match doc.tag(node) {
        Some("button") => true,
        Some("input") => matches!(
            input_type(doc, node).as_str(),
            "button" | "submit" | "reset"
        ),
        Some("a") => anchor_is_button(doc, node),
        _ => false,
    }
}

fn anchor_is_button(doc: &Document, node: NodeId) -> bool {
    if doc
        .attr(node, "role")
        .is_some_and(|r| r.eq_ignore_ascii_case("button"))
    {
        return true;
    }
    if ACTION_ATTRIBUTES.iter().any(|a| doc.has_attr(node, a)) {
        return true;
    }
    doc.attr(node, "class").is_some_and(|class| {
        let lower = class.to_ascii_lowercase();
        lower.contains("btn") || lower.contains("button")
    })
}

/// `input` or `textarea`, regardless of input type.
fn is_text_entry(doc: &Document, node: NodeId) -> bool {
    matches!(doc.tag(node), Some("input") | Some("textarea"))
}

fn is_select_display(doc: &Document, node: NodeId) -> bool {
    if doc.attr(node, "xtype") == Some("select") {
        return true;
    }
    doc.has_attr(node, NAME_ATTRIBUTE) && doc.has_class(node, "bh-form-static")
}

/// Editable field a user types into: `textarea`, or an `input` that is not
/// hidden and not a button.
pub fn is_input_like(doc: &Document, node: NodeId) -> bool {
    match doc.tag(node) {
        Some("textarea") => true,
        Some("input") => !matches!(
            input_type(doc, node).as_str(),
            "hidden" | "submit" | "button" | "reset" | "image"
        ),
        _ => false,
    }
}

/// Raw `type` recorded in a descriptor.
pub fn raw_type(doc: &Document, node: NodeId) -> String {
    match doc.tag(node) {
        Some("input") => input_type(doc, node),
        Some(tag) => tag.to_string(),
        None => String::new(),
    }
}

/// Whether a scan should record this element.
pub fn is_scan_candidate(doc: &Document, node: NodeId) -> bool {
    match doc.tag(node) {
        Some("input") => input_type(doc, node) != "hidden",
        Some("textarea") | Some("button") => true,
        Some("a") => anchor_is_button(doc, node),
        Some("p") => doc.attr(node, "xtype") == Some("select") || doc.has_attr(node, NAME_ATTRIBUTE),
        Some("span") => doc.has_attr(node, NAME_ATTRIBUTE),
        Some("div") => doc.has_class(node, "bh-form-static") && doc.has_attr(node, NAME_ATTRIBUTE),
        _ => false,
    }
}

/// Visible caption of a button-like element: the value of an input button,
/// otherwise its trimmed text.
pub fn button_text(doc: &Document, node: NodeId) -> String {
    if doc.tag(node) == Some("input") {
        return doc.value(node).trim().to_string();
    }
    doc.text_content(node).trim().to_string()
}
