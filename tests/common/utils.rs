#![allow(dead_code)]

use page_anchor::dom::{Document, NodeId, Rect, Size};
use page_anchor::screen::{ElementType, SavedConfigEntry};

pub const ROW_HEIGHT: f64 = 30.0;

/// Parse `html` and give every element a visible box, one row per element
/// in document order.
pub fn laid_out(html: &str) -> Document {
    let mut doc = Document::parse(html).unwrap();
    for (row, node) in doc.elements().into_iter().enumerate() {
        doc.set_rect(node, Rect::new(10.0, row as f64 * ROW_HEIGHT, 200.0, 24.0));
    }
    doc.layout_mut().set_viewport(Size {
        width: 1000.0,
        height: 800.0,
    });
    doc
}

pub fn first(doc: &Document, selector: &str) -> NodeId {
    doc.query_selector(None, selector)
        .unwrap()
        .unwrap_or_else(|| panic!("no element matches {}", selector))
}

pub fn all(doc: &Document, selector: &str) -> Vec<NodeId> {
    doc.query_selector_all(None, selector).unwrap()
}

/// Saved entry with only the fields a test cares about filled in.
pub fn entry(element_type: ElementType, container_selector: &str) -> SavedConfigEntry {
    SavedConfigEntry {
        index: 0,
        label: None,
        name: None,
        container_selector: container_selector.to_string(),
        fallback_name: None,
        placeholder: None,
        element_type,
        data_name: None,
        xtype: None,
        button_text: None,
        found_by: None,
    }
}

/// Two same-name fields told apart only by their group labels.
pub fn city_form(first_id: &str, second_id: &str) -> String {
    format!(
        r#"<html><body>
<form class="main">
  <div class="bh-form-group">
    <label class="bh-form-label">City</label>
    <input name="city" id="{}" value="Hangzhou">
  </div>
  <div class="bh-form-group">
    <label class="bh-form-label">Billing City</label>
    <input name="city" id="{}" value="Shanghai">
  </div>
</form>
</body></html>"#,
        first_id, second_id
    )
}
