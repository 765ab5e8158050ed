use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dom::{Document, NodeId};
use crate::error::SelectorError;
use crate::resolve::strategy::{FoundBy, Strategy};
use crate::screen::classifier::{button_text, is_button_like, is_input_like};
use crate::screen::container::{form_group_label, is_overlay_owned};
use crate::screen::descriptor::{ElementType, SavedConfigEntry};

/// Reference to a live element inside the page context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    pub node: NodeId,
    pub tag: String,
}

/// One saved entry mapped back onto the live page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResult {
    /// Position of the entry in the request, not in the document.
    pub config_index: usize,
    pub label: Option<String>,
    pub element: ElementRef,
    pub value: String,
    pub found_by: FoundBy,
}

/// A successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub node: NodeId,
    pub found_by: FoundBy,
}

/// Re-locates saved entries in a document.
///
/// Every strategy is a bounded scan. A strategy that cannot run (bad
/// selector, missing attribute) is a miss and the chain moves on.
pub struct ElementResolver<'d> {
    doc: &'d Document,
}

impl<'d> ElementResolver<'d> {
    pub fn new(doc: &'d Document) -> Self {
        ElementResolver { doc }
    }

    pub fn resolve_one(&self, entry: &SavedConfigEntry) -> Option<Resolution> {
        for strategy in Strategy::fallback_chain(entry.element_type) {
            debug!(entry = entry.display_name(), strategy = strategy.name(), "Trying strategy");

            match self.run(*strategy, entry) {
                Ok(Some(resolution)) => return Some(resolution),
                Ok(None) => {
                    debug!(strategy = strategy.name(), "Strategy returned no match");
                }
                Err(e) => {
                    warn!(
                        entry = entry.display_name(),
                        strategy = strategy.name(),
                        error = %e,
                        "Strategy failed, trying next"
                    );
                }
            }
        }
        None
    }

    /// Resolve every entry. Unresolved entries are omitted; the output
    /// follows entry order.
    pub fn resolve_all(&self, entries: &[SavedConfigEntry]) -> Vec<ExtractResult> {
        let mut results = Vec::with_capacity(entries.len());

        for (config_index, entry) in entries.iter().enumerate() {
            let Some(resolution) = self.resolve_one(entry) else {
                warn!(config_index, entry = entry.display_name(), "Element not found");
                continue;
            };

            let value = extract_value(self.doc, resolution.node, entry.element_type);
            info!(
                config_index,
                entry = entry.display_name(),
                found_by = %resolution.found_by,
                "Resolved element"
            );
            results.push(ExtractResult {
                config_index,
                label: entry.label.clone(),
                element: ElementRef {
                    node: resolution.node,
                    tag: self.doc.tag(resolution.node).unwrap_or_default().to_string(),
                },
                value,
                found_by: resolution.found_by,
            });
        }

        info!(found = results.len(), total = entries.len(), "Extraction finished");
        results
    }

    fn run(
        &self,
        strategy: Strategy,
        entry: &SavedConfigEntry,
    ) -> Result<Option<Resolution>, SelectorError> {
        match strategy {
            Strategy::Container => self.by_container(entry),
            Strategy::DataName => Ok(self.by_data_name(entry)),
            Strategy::NameAttribute => Ok(self.by_name(entry)),
            Strategy::Placeholder => Ok(self.by_placeholder(entry)),
            Strategy::ButtonText => Ok(self.by_button_text(entry)),
        }
    }

    // ------------------------------------------------------------------
    // Container strategy
    // ------------------------------------------------------------------

    fn by_container(&self, entry: &SavedConfigEntry) -> Result<Option<Resolution>, SelectorError> {
        let containers = self
            .doc
            .query_selector_all(None, &entry.container_selector)?;

        for container in containers {
            if is_overlay_owned(self.doc, container) {
                continue;
            }
            let Some(candidate) = self.candidate_in(container, entry) else {
                continue;
            };
            match self.verify_label(candidate, entry) {
                Some(found_by) => {
                    return Ok(Some(Resolution {
                        node: candidate,
                        found_by,
                    }));
                }
                None => {
                    debug!(
                        node = candidate.0,
                        expected = ?entry.label,
                        "Label mismatch, trying next container match"
                    );
                }
            }
        }
        Ok(None)
    }

    fn candidate_in(&self, container: NodeId, entry: &SavedConfigEntry) -> Option<NodeId> {
        let doc = self.doc;
        match entry.element_type {
            ElementType::Input => {
                if is_input_like(doc, container) {
                    return Some(container);
                }
                doc.descendants(container)
                    .into_iter()
                    .find(|n| is_input_like(doc, *n) && !doc.is_hidden_by_style(*n))
            }
            ElementType::Button => {
                let mut buttons = std::iter::once(container)
                    .chain(doc.descendants(container))
                    .filter(|n| is_button_like(doc, *n));
                match entry.button_text.as_deref() {
                    Some(text) => buttons.find(|n| button_text(doc, *n) == text),
                    None => buttons.next(),
                }
            }
            ElementType::SelectDisplay | ElementType::TextDisplay => {
                let descendants = doc.descendants(container);
                let by_attr = |name: &str, value: Option<&str>| {
                    let value = value?;
                    descendants
                        .iter()
                        .copied()
                        .find(|n| doc.attr(*n, name) == Some(value))
                };
                by_attr("data-name", entry.data_name.as_deref())
                    .or_else(|| by_attr("xtype", entry.xtype.as_deref()))
                    .or_else(|| {
                        descendants
                            .iter()
                            .copied()
                            .find(|n| doc.has_attr(*n, "data-name"))
                    })
            }
        }
    }

    /// Accept when the entry has no label, when the live label equals it,
    /// or when the page shows no label at all. A differing label rejects.
    fn verify_label(&self, candidate: NodeId, entry: &SavedConfigEntry) -> Option<FoundBy> {
        let Some(expected) = entry.label.as_deref() else {
            return Some(FoundBy::Container);
        };
        match form_group_label(self.doc, candidate) {
            Some(actual) if actual == expected => Some(FoundBy::ContainerLabel),
            Some(_) => None,
            None => Some(FoundBy::ContainerUnverified),
        }
    }

    fn label_matches(&self, node: NodeId, entry: &SavedConfigEntry) -> bool {
        entry
            .label
            .as_deref()
            .is_some_and(|expected| form_group_label(self.doc, node).as_deref() == Some(expected))
    }

    // ------------------------------------------------------------------
    // Document-wide strategies
    // ------------------------------------------------------------------

    /// Unique hit wins, then a label-confirmed hit, then the first hit.
    fn pick(
        &self,
        candidates: Vec<NodeId>,
        entry: &SavedConfigEntry,
        found: [FoundBy; 3],
    ) -> Option<Resolution> {
        let [unique, labelled, first] = found;
        match candidates.as_slice() {
            [] => None,
            [only] => Some(Resolution {
                node: *only,
                found_by: unique,
            }),
            [head, ..] => {
                let node = candidates.iter().copied().find(|n| self.label_matches(*n, entry));
                Some(match node {
                    Some(node) => Resolution {
                        node,
                        found_by: labelled,
                    },
                    None => Resolution {
                        node: *head,
                        found_by: first,
                    },
                })
            }
        }
    }

    fn by_data_name(&self, entry: &SavedConfigEntry) -> Option<Resolution> {
        let data_name = entry.data_name.as_deref().filter(|v| !v.is_empty())?;
        let candidates: Vec<NodeId> = self
            .doc
            .elements()
            .into_iter()
            .filter(|n| self.doc.attr(*n, "data-name") == Some(data_name))
            .collect();
        self.pick(
            candidates,
            entry,
            [
                FoundBy::DataName,
                FoundBy::DataNameLabel,
                FoundBy::DataNameFirst,
            ],
        )
    }

    fn by_name(&self, entry: &SavedConfigEntry) -> Option<Resolution> {
        let name = entry.lookup_name()?;
        let candidates: Vec<NodeId> = self
            .doc
            .elements()
            .into_iter()
            .filter(|n| is_input_like(self.doc, *n) && self.doc.attr(*n, "name") == Some(name))
            .collect();
        self.pick(
            candidates,
            entry,
            [
                FoundBy::NameAttribute,
                FoundBy::NameAttributeLabel,
                FoundBy::NameAttributeFirst,
            ],
        )
    }

    fn by_placeholder(&self, entry: &SavedConfigEntry) -> Option<Resolution> {
        let placeholder = entry.placeholder.as_deref().filter(|v| !v.is_empty())?;
        self.doc
            .elements()
            .into_iter()
            .find(|n| {
                is_input_like(self.doc, *n) && self.doc.attr(*n, "placeholder") == Some(placeholder)
            })
            .map(|node| Resolution {
                node,
                found_by: FoundBy::Placeholder,
            })
    }

    fn by_button_text(&self, entry: &SavedConfigEntry) -> Option<Resolution> {
        let text = entry.button_text.as_deref().filter(|v| !v.is_empty())?;
        let candidates: Vec<NodeId> = self
            .doc
            .elements()
            .into_iter()
            .filter(|n| is_button_like(self.doc, *n) && button_text(self.doc, *n) == text)
            .collect();

        if let Some(node) = candidates.iter().copied().find(|n| self.label_matches(*n, entry)) {
            return Some(Resolution {
                node,
                found_by: FoundBy::ButtonTextLabel,
            });
        }
        candidates.first().map(|node| Resolution {
            node: *node,
            found_by: FoundBy::ButtonText,
        })
    }
}

/// Current value of a resolved element: the editable value of a field, the
/// caption of a button, the trimmed text of anything else.
pub fn extract_value(doc: &Document, node: NodeId, element_type: ElementType) -> String {
    match element_type {
        ElementType::Input if matches!(doc.tag(node), Some("input") | Some("textarea")) => {
            doc.value(node).to_string()
        }
        ElementType::Button => button_text(doc, node),
        _ => doc.text_content(node).trim().to_string(),
    }
}
