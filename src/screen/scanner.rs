use tracing::{debug, info};

use crate::dom::{Document, NodeId};
use crate::screen::classifier::{button_text, classify, is_scan_candidate, raw_type};
use crate::screen::container::{container_label, find_container, is_overlay_owned};
use crate::screen::descriptor::{ElementDescriptor, ElementType};
use crate::screen::selector_path::SelectorPathBuilder;
use crate::screen::stability::StabilityPolicy;

/// One scanned element together with the live node it describes.
#[derive(Debug, Clone)]
pub struct ScannedElement {
    pub descriptor: ElementDescriptor,
    pub node: NodeId,
}

/// Walks a document and describes every candidate element.
#[derive(Debug, Clone, Default)]
pub struct ElementScanner {
    paths: SelectorPathBuilder,
}

impl ElementScanner {
    pub fn new(policy: StabilityPolicy) -> Self {
        ElementScanner {
            paths: SelectorPathBuilder::new(policy),
        }
    }

    pub fn path_builder(&self) -> &SelectorPathBuilder {
        &self.paths
    }

    /// Describe every candidate in document order. Indexes are assigned
    /// sequentially from zero, so they are unique within the result.
    pub fn scan(&self, doc: &Document) -> Vec<ScannedElement> {
        let scanned: Vec<ScannedElement> = doc
            .elements()
            .into_iter()
            .filter(|n| is_scan_candidate(doc, *n) && !is_overlay_owned(doc, *n))
            .enumerate()
            .map(|(index, node)| ScannedElement {
                descriptor: self.describe(doc, node, index),
                node,
            })
            .collect();

        info!(count = scanned.len(), "Scanned page elements");
        scanned
    }

    pub fn describe(&self, doc: &Document, node: NodeId, index: usize) -> ElementDescriptor {
        let element_type = classify(doc, node);
        let container = find_container(doc, node);
        let label = container.and_then(|c| container_label(doc, c));
        let container_path = match container {
            Some(c) => self.paths.generate_stable_selector(doc, c),
            None => self.paths.generate_stable_selector(doc, node),
        };

        let owned = |name: &str| doc.non_empty_attr(node, name).map(str::to_string);
        let descriptor = ElementDescriptor {
            index,
            label,
            name: owned("name"),
            id: owned("id"),
            kind: raw_type(doc, node),
            element_type,
            data_name: owned("data-name"),
            xtype: owned("xtype"),
            container_path,
            placeholder: owned("placeholder"),
            button_text: (element_type == ElementType::Button)
                .then(|| button_text(doc, node))
                .filter(|t| !t.is_empty()),
            disabled: doc.has_attr(node, "disabled"),
        };

        debug!(
            index,
            element_type = %descriptor.element_type,
            container = %descriptor.container_path,
            label = ?descriptor.label,
            "Described element"
        );
        descriptor
    }
}
