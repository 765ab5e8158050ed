use serde::{Deserialize, Serialize};

use crate::dom::Document;
use crate::resolve::resolver::ExtractResult;
use crate::screen::descriptor::{ElementType, SavedConfigEntry};

/// Position of a resolved element as fractions of the full page size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaLayoutEntry {
    pub config_index: usize,
    pub label: Option<String>,
    pub element_type: ElementType,
    pub value: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Normalise extraction results into page-relative boxes.
///
/// The element type comes from the saved entry the result points at.
pub fn generate_replica(
    doc: &Document,
    entries: &[SavedConfigEntry],
    results: &[ExtractResult],
) -> Vec<ReplicaLayoutEntry> {
    let page = doc.layout().page_size();
    let scroll = doc.layout().window_scroll();

    results
        .iter()
        .filter_map(|result| {
            let entry = entries.get(result.config_index)?;
            let rect = doc.bounding_client_rect(result.element.node);
            Some(ReplicaLayoutEntry {
                config_index: result.config_index,
                label: result.label.clone(),
                element_type: entry.element_type,
                value: result.value.clone(),
                x: fraction(rect.x + scroll.x, page.width),
                y: fraction(rect.y + scroll.y, page.height),
                width: fraction(rect.width, page.width),
                height: fraction(rect.height, page.height),
            })
        })
        .collect()
}

fn fraction(value: f64, total: f64) -> f64 {
    if total > 0.0 {
        value / total
    } else {
        0.0
    }
}
