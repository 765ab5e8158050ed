use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::dom::{Document, NodeId, PageSnapshot, Size};
use crate::error::PageError;
use crate::overlay::{OverlayManager, OverlayOptions, OverlaySettings};
use crate::page::events::{EventHub, EventKind, EventTarget, Subscriber};
use crate::page::message::{Message, Request, Response, ResizePayload, ScrollPayload};
use crate::resolve::{generate_replica, ElementResolver, ExtractResult, ReplicaLayoutEntry};
use crate::screen::{
    ElementDescriptor, ElementScanner, SavedConfigEntry, ScannedElement, StabilityPolicy,
};

const HIGHLIGHT_ID: &str = "highlight";
const HIGHLIGHT_ENTRY_ID: &str = "highlight-entry";

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HighlightColors {
    #[serde(default = "default_scan_color")]
    pub scan: String,
    #[serde(default = "default_saved_color")]
    pub saved: String,
    #[serde(default = "default_extracted_color")]
    pub extracted: String,
    #[serde(default = "default_saved_color")]
    pub highlight: String,
}

fn default_scan_color() -> String {
    "#00bfff".to_string()
}

fn default_saved_color() -> String {
    "#4caf50".to_string()
}

fn default_extracted_color() -> String {
    "#ff9800".to_string()
}

impl Default for HighlightColors {
    fn default() -> Self {
        HighlightColors {
            scan: default_scan_color(),
            saved: default_saved_color(),
            extracted: default_extracted_color(),
            highlight: default_saved_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HighlightSettings {
    /// Lifetime of a `HIGHLIGHT_BY_INDEX` overlay.
    #[serde(default = "default_index_ms")]
    pub index_ms: u64,
    /// Lifetime of a `HIGHLIGHT_BY_CONFIG_ENTRY` overlay.
    #[serde(default = "default_entry_ms")]
    pub entry_ms: u64,
    #[serde(default)]
    pub colors: HighlightColors,
}

fn default_index_ms() -> u64 {
    1000
}

fn default_entry_ms() -> u64 {
    2000
}

impl Default for HighlightSettings {
    fn default() -> Self {
        HighlightSettings {
            index_ms: default_index_ms(),
            entry_ms: default_entry_ms(),
            colors: HighlightColors::default(),
        }
    }
}

/// Everything a page context is configured with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextSettings {
    pub stability: StabilityPolicy,
    pub overlay: OverlaySettings,
    pub highlight: HighlightSettings,
}

/// Overlay state reported by `GET_OVERLAYS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayInfo {
    pub id: String,
    pub target: NodeId,
    pub visible: bool,
    pub animated: bool,
    pub color: String,
    pub label: Option<String>,
}

// ============================================================================
// Page context
// ============================================================================

/// State that lives as long as one page: the document, the last scan
/// generation, the saved configuration and the overlay layer.
#[derive(Debug)]
pub struct PageContext {
    doc: Document,
    scanner: ElementScanner,
    overlays: OverlayManager,
    events: EventHub,
    scanned: Vec<ScannedElement>,
    config: Vec<SavedConfigEntry>,
    highlight: HighlightSettings,
}

impl PageContext {
    pub fn new(doc: Document, settings: ContextSettings) -> Self {
        let mut events = EventHub::new();
        let mut overlays = OverlayManager::new(settings.overlay);
        overlays.init(&mut events);

        PageContext {
            doc,
            scanner: ElementScanner::new(settings.stability),
            overlays,
            events,
            scanned: Vec::new(),
            config: Vec::new(),
            highlight: settings.highlight,
        }
    }

    pub fn from_snapshot(
        snapshot: PageSnapshot,
        settings: ContextSettings,
    ) -> Result<Self, PageError> {
        Ok(Self::new(snapshot.into_document()?, settings))
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn scanned(&self) -> &[ScannedElement] {
        &self.scanned
    }

    pub fn saved_config(&self) -> &[SavedConfigEntry] {
        &self.config
    }

    // ------------------------------------------------------------------
    // Message dispatch
    // ------------------------------------------------------------------

    /// Run one request. Failures come back as `{error}`, never as a panic.
    pub fn handle(&mut self, message: &Message) -> Response {
        debug!(kind = %message.kind, "Handling message");
        match self.dispatch(message) {
            Ok(value) => Response::Ok(value),
            Err(e) => {
                warn!(kind = %message.kind, error = %e, "Request failed");
                Response::Error(e.to_string())
            }
        }
    }

    fn dispatch(&mut self, message: &Message) -> Result<Value, PageError> {
        let value = match Request::from_message(message)? {
            Request::ScanAll => to_json("scan results", &self.scan_all())?,
            Request::SaveByIndexes(indexes) => {
                to_json("saved config", &self.save_by_indexes(&indexes))?
            }
            Request::ExtractByConfig(config) => {
                to_json("extract results", &self.extract_by_config(&config))?
            }
            Request::GenerateReplicaData(config) => {
                to_json("replica data", &self.generate_replica_data(&config))?
            }
            Request::HighlightByIndex(index) => {
                self.highlight_by_index(index);
                Value::Null
            }
            Request::HighlightByConfigEntry {
                config_index,
                entry,
            } => {
                self.highlight_by_config_entry(config_index, &entry);
                Value::Null
            }
            Request::ClearHighlight => {
                self.clear_highlight();
                Value::Null
            }
            Request::LoadPage(snapshot) => {
                self.load_page(snapshot.into_document()?);
                Value::Null
            }
            Request::Scroll(ScrollPayload { node, x, y }) => {
                let target = match node {
                    Some(node) if self.doc.is_element(node) && self.doc.is_connected(node) => {
                        Some(node)
                    }
                    Some(node) => return Err(PageError::NoSuchNode(node.0)),
                    None => None,
                };
                self.scroll(target, x, y);
                Value::Null
            }
            Request::Resize(ResizePayload { width, height }) => {
                self.resize(width, height);
                Value::Null
            }
            Request::Tick(now) => {
                self.advance(now);
                json!({ "now": self.overlays.now() })
            }
            Request::GetOverlays => to_json("overlays", &self.overlay_info())?,
        };
        Ok(value)
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Replace the scan generation and draw a numbered overlay per element.
    pub fn scan_all(&mut self) -> Vec<ElementDescriptor> {
        self.clear_highlight();
        self.scanned = self.scanner.scan(&self.doc);

        let color = self.highlight.colors.scan.clone();
        for item in &self.scanned {
            let index = item.descriptor.index;
            self.overlays.create(
                &mut self.doc,
                &scan_overlay_id(index),
                item.node,
                OverlayOptions::new(&color, Some(format!("#{}", index))),
            );
        }

        self.scanned.iter().map(|s| s.descriptor.clone()).collect()
    }

    /// Turn the chosen scan indexes into saved entries, in request order.
    /// Unknown indexes are skipped.
    pub fn save_by_indexes(&mut self, indexes: &[usize]) -> Vec<SavedConfigEntry> {
        let color = self.highlight.colors.saved.clone();
        let mut config = Vec::with_capacity(indexes.len());

        for index in indexes {
            let Some(item) = self.scanned.iter().find(|s| s.descriptor.index == *index) else {
                warn!(index, "No scanned element with this index");
                continue;
            };
            self.overlays
                .update_overlay_color(&mut self.doc, &scan_overlay_id(*index), &color);
            config.push(SavedConfigEntry::from(&item.descriptor));
        }

        info!(saved = config.len(), requested = indexes.len(), "Saved configuration");
        self.config = config.clone();
        config
    }

    pub fn extract_by_config(&mut self, config: &[SavedConfigEntry]) -> Vec<ExtractResult> {
        if config.is_empty() {
            warn!("No configuration to extract");
            return Vec::new();
        }
        self.clear_highlight();

        let results = ElementResolver::new(&self.doc).resolve_all(config);

        let color = self.highlight.colors.extracted.clone();
        for result in &results {
            self.overlays.create(
                &mut self.doc,
                &format!("extract-{}", result.config_index),
                result.element.node,
                OverlayOptions::new(&color, Some(format!("\u{2713}{}", result.config_index))),
            );
        }
        results
    }

    pub fn generate_replica_data(
        &mut self,
        config: &[SavedConfigEntry],
    ) -> Vec<ReplicaLayoutEntry> {
        let results = ElementResolver::new(&self.doc).resolve_all(config);
        generate_replica(&self.doc, config, &results)
    }

    /// Flash the scanned element at `index`. Unknown indexes are ignored.
    pub fn highlight_by_index(&mut self, index: usize) {
        let Some(node) = self
            .scanned
            .iter()
            .find(|s| s.descriptor.index == index)
            .map(|s| s.node)
        else {
            debug!(index, "Nothing to highlight");
            return;
        };

        let options = OverlayOptions::new(&self.highlight.colors.highlight, None);
        if self
            .overlays
            .create(&mut self.doc, HIGHLIGHT_ID, node, options)
            .is_some()
        {
            self.overlays
                .schedule_removal(HIGHLIGHT_ID, self.highlight.index_ms);
        }
    }

    /// Resolve `entry` from scratch and flash the element it finds.
    pub fn highlight_by_config_entry(&mut self, config_index: usize, entry: &SavedConfigEntry) {
        let Some(resolution) = ElementResolver::new(&self.doc).resolve_one(entry) else {
            warn!(
                config_index,
                entry = entry.display_name(),
                "Cannot highlight unresolved entry"
            );
            return;
        };

        let options = OverlayOptions::new(
            &self.highlight.colors.highlight,
            Some(format!("\u{2713}{}", config_index)),
        );
        if self
            .overlays
            .create(&mut self.doc, HIGHLIGHT_ENTRY_ID, resolution.node, options)
            .is_some()
        {
            self.overlays
                .schedule_removal(HIGHLIGHT_ENTRY_ID, self.highlight.entry_ms);
        }
    }

    pub fn clear_highlight(&mut self) {
        self.overlays.clear_all(&mut self.doc);
    }

    // ------------------------------------------------------------------
    // Page lifecycle and events
    // ------------------------------------------------------------------

    /// Swap in a freshly loaded page. The previous scan generation refers to
    /// nodes that no longer exist, so it is dropped.
    pub fn load_page(&mut self, doc: Document) {
        self.overlays.clear_all(&mut self.doc);
        self.doc = doc;
        self.scanned.clear();
        info!(elements = self.doc.elements().len(), "Loaded page");
    }

    /// Scroll the window (`None`) or a nested scroll container.
    pub fn scroll(&mut self, target: Option<NodeId>, x: f64, y: f64) {
        let event_target = match target {
            Some(node) => {
                self.doc.scroll_element_to(node, x, y);
                EventTarget::Element(node)
            }
            None => {
                self.doc.scroll_window_to(x, y);
                EventTarget::Window
            }
        };
        self.fire(EventKind::Scroll, event_target);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.doc.layout_mut().set_viewport(Size { width, height });
        self.fire(EventKind::Resize, EventTarget::Window);
    }

    fn fire(&mut self, kind: EventKind, target: EventTarget) {
        for subscriber in self.events.dispatch(kind, target) {
            match subscriber {
                Subscriber::OverlayPositions => {
                    self.overlays.update_all_positions(&mut self.doc);
                }
            }
        }
    }

    /// Run animation frames and timers due at `now_ms`.
    pub fn advance(&mut self, now_ms: u64) {
        self.overlays.advance(&mut self.doc, now_ms);
    }

    /// Tear down the overlay layer and its listeners.
    pub fn destroy(&mut self) {
        self.overlays.destroy(&mut self.doc, &mut self.events);
    }

    pub fn overlay_info(&self) -> Vec<OverlayInfo> {
        self.overlays
            .ids()
            .filter_map(|id| {
                let state = self.overlays.get(id)?;
                Some(OverlayInfo {
                    id: id.to_string(),
                    target: state.target,
                    visible: state.style.visible,
                    animated: state.style.glow.is_animated(),
                    color: state.options.color.clone(),
                    label: state.options.label.clone(),
                })
            })
            .collect()
    }
}

pub fn scan_overlay_id(index: usize) -> String {
    format!("scan-{}", index)
}

fn to_json<T: Serialize>(context: &str, value: &T) -> Result<Value, PageError> {
    serde_json::to_value(value).map_err(|source| PageError::JsonSerialize {
        context: context.to_string(),
        source,
    })
}
