use tracing::trace;

use crate::dom::selector::{css_escape_ident, css_quote, Selector};
use crate::dom::{Document, NodeId};
use crate::screen::stability::StabilityPolicy;

/// Builds short container paths that survive regenerated ids and classes.
#[derive(Debug, Clone, Default)]
pub struct SelectorPathBuilder {
    policy: StabilityPolicy,
}

impl SelectorPathBuilder {
    pub fn new(policy: StabilityPolicy) -> Self {
        SelectorPathBuilder { policy }
    }

    pub fn policy(&self) -> &StabilityPolicy {
        &self.policy
    }

    /// Walk from `node` towards `body`, emitting one qualified level per
    /// ancestor. Stops at `max_depth` levels or at the first stable id.
    pub fn generate_stable_selector(&self, doc: &Document, node: NodeId) -> String {
        let body = doc.body();
        let mut levels: Vec<String> = Vec::new();
        let mut current = node;

        while levels.len() < self.policy.max_depth && Some(current) != body {
            let Some(parent) = doc.parent_element(current) else {
                break;
            };
            let Some(tag) = doc.tag(current) else {
                break;
            };

            let mut level = tag.to_string();

            if let Some(id) = doc.attr(current, "id") {
                if self.policy.is_stable_id(id) {
                    level.push('#');
                    level.push_str(&css_escape_ident(id));
                    levels.push(level);
                    break;
                }
            }

            for class_name in self.stable_classes(doc, current) {
                level.push('.');
                level.push_str(&css_escape_ident(class_name));
            }

            let anchored = match self.anchor_attribute(doc, current) {
                Some((name, value)) => {
                    level.push_str(&format!("[{}={}]", name, css_quote(value)));
                    true
                }
                None => false,
            };

            if !anchored && self.has_similar_siblings(doc, parent, &level) {
                if let Some(index) = doc.child_index(current) {
                    level.push_str(&format!(":nth-child({})", index));
                }
            }

            levels.push(level);
            current = parent;
        }

        if levels.is_empty() {
            return doc.tag(node).unwrap_or("*").to_string();
        }

        levels.reverse();
        let selector = levels.join(self.policy.combinator.separator());
        trace!(node = node.0, %selector, "Generated container path");
        selector
    }

    fn stable_classes<'d>(&self, doc: &'d Document, node: NodeId) -> Vec<&'d str> {
        doc.element(node)
            .map(|e| {
                e.classes()
                    .filter(|c| self.policy.is_stable_class(c))
                    .take(self.policy.max_classes)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn anchor_attribute<'d>(&self, doc: &'d Document, node: NodeId) -> Option<(&'d str, &'d str)> {
        let element = doc.element(node)?;
        self.policy.anchor_attributes.iter().find_map(|name| {
            element
                .attrs()
                .find(|(k, v)| *k == name.as_str() && !v.is_empty())
        })
    }

    /// More than one direct child of `parent` matches `level`. A level that
    /// fails to parse counts as ambiguous.
    fn has_similar_siblings(&self, doc: &Document, parent: NodeId, level: &str) -> bool {
        match Selector::parse(level) {
            Ok(selector) => {
                doc.children(parent)
                    .into_iter()
                    .filter(|c| selector.matches(doc, *c))
                    .count()
                    > 1
            }
            Err(_) => true,
        }
    }
}

/// Path under the default stability policy.
pub fn generate_stable_selector(doc: &Document, node: NodeId) -> String {
    SelectorPathBuilder::default().generate_stable_selector(doc, node)
}
