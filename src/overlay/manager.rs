use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dom::{Document, NodeId, Rect};
use crate::overlay::clock::{FrameClock, FrameHandle};
use crate::overlay::style::{
    label_css, Glow, OverlayStyle, LABEL_CLASS, OVERLAY_ATTR, OVERLAY_CLASS, OVERLAY_ID_ATTR,
};
use crate::page::events::{EventHub, EventKind, ListenerId, Subscriber};

// ============================================================================
// Settings and per-overlay state
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OverlaySettings {
    /// Overlays animate while at most this many are active.
    #[serde(default = "default_animation_limit")]
    pub animation_limit: usize,

    #[serde(default = "default_pulse_period_ms")]
    pub pulse_period_ms: u64,

    /// Shadow blur used when animation is disabled.
    #[serde(default = "default_static_blur")]
    pub static_blur: f64,
}

fn default_animation_limit() -> usize {
    20
}

fn default_pulse_period_ms() -> u64 {
    2000
}

fn default_static_blur() -> f64 {
    20.0
}

impl Default for OverlaySettings {
    fn default() -> Self {
        OverlaySettings {
            animation_limit: default_animation_limit(),
            pulse_period_ms: default_pulse_period_ms(),
            static_blur: default_static_blur(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayOptions {
    pub color: String,
    #[serde(default)]
    pub label: Option<String>,
}

impl OverlayOptions {
    pub fn new(color: &str, label: Option<String>) -> Self {
        OverlayOptions {
            color: color.to_string(),
            label,
        }
    }
}

/// Work the manager schedules on its frame clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayTask {
    /// Next animation frame for an overlay
    Pulse(String),
    /// Timed removal of a transient overlay
    Remove(String),
}

#[derive(Debug, Clone)]
pub struct OverlayState {
    pub node: NodeId,
    pub label_node: Option<NodeId>,
    pub target: NodeId,
    pub options: OverlayOptions,
    pub style: OverlayStyle,
    started_ms: u64,
}

// ============================================================================
// Manager
// ============================================================================

/// Owns every decoration node drawn over the page.
///
/// Decorations are appended to `body`, never inside the target's subtree,
/// and carry `OVERLAY_ATTR` so scans skip them.
#[derive(Debug, Default)]
pub struct OverlayManager {
    settings: OverlaySettings,
    overlays: BTreeMap<String, OverlayState>,
    animations: HashMap<String, FrameHandle>,
    removals: HashMap<String, FrameHandle>,
    clock: FrameClock<OverlayTask>,
    listeners: Vec<ListenerId>,
}

impl OverlayManager {
    pub fn new(settings: OverlaySettings) -> Self {
        OverlayManager {
            settings,
            ..Default::default()
        }
    }

    pub fn settings(&self) -> &OverlaySettings {
        &self.settings
    }

    /// Subscribe to scroll (capture phase, to see nested scroll containers)
    /// and resize. Calling it twice does not double-subscribe.
    pub fn init(&mut self, hub: &mut EventHub) {
        if !self.listeners.is_empty() {
            return;
        }
        let scroll = hub.add_listener(EventKind::Scroll, Subscriber::OverlayPositions, true);
        let resize = hub.add_listener(EventKind::Resize, Subscriber::OverlayPositions, false);
        self.listeners = vec![scroll, resize];
        debug!("Overlay manager initialised");
    }

    /// Remove every overlay and unsubscribe from page events.
    pub fn destroy(&mut self, doc: &mut Document, hub: &mut EventHub) {
        self.clear_all(doc);
        for id in self.listeners.drain(..) {
            hub.remove_listener(id);
        }
        debug!("Overlay manager destroyed");
    }

    pub fn count(&self) -> usize {
        self.overlays.len()
    }

    pub fn get(&self, id: &str) -> Option<&OverlayState> {
        self.overlays.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.overlays.keys().map(String::as_str)
    }

    /// Running animation handles.
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Tasks still queued on the frame clock (animation frames and timers).
    pub fn pending_tasks(&self) -> usize {
        self.clock.pending()
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    // ------------------------------------------------------------------
    // Create / remove
    // ------------------------------------------------------------------

    /// Draw an overlay over `target`, replacing any overlay with the same id.
    ///
    /// Returns `None` and draws nothing when neither the target nor a
    /// related stand-in has visible geometry.
    pub fn create(
        &mut self,
        doc: &mut Document,
        id: &str,
        target: NodeId,
        options: OverlayOptions,
    ) -> Option<NodeId> {
        self.remove_overlay(doc, id);

        let Some(rect) = target_rect(doc, target) else {
            warn!(id, node = target.0, "Cannot create overlay for invisible element");
            return None;
        };
        let Some(body) = doc.body() else {
            warn!(id, "Document has no body to attach overlays to");
            return None;
        };

        let style = OverlayStyle {
            rect,
            color: options.color.clone(),
            visible: true,
            glow: Glow::pulse_at(0, self.settings.pulse_period_ms),
        };

        let node = doc.create_element(
            "div",
            vec![
                ("class".to_string(), OVERLAY_CLASS.to_string()),
                (OVERLAY_ATTR.to_string(), "true".to_string()),
                (OVERLAY_ID_ATTR.to_string(), id.to_string()),
                ("style".to_string(), style.to_css()),
            ],
        );

        let label_node = options.label.as_deref().map(|text| {
            let label = doc.create_element(
                "span",
                vec![
                    ("class".to_string(), LABEL_CLASS.to_string()),
                    (OVERLAY_ATTR.to_string(), "true".to_string()),
                    ("style".to_string(), label_css(&options.color)),
                ],
            );
            let text = doc.create_text(text);
            doc.append_child(label, text);
            doc.append_child(node, label);
            label
        });

        doc.append_child(body, node);

        self.overlays.insert(
            id.to_string(),
            OverlayState {
                node,
                label_node,
                target,
                options,
                style,
                started_ms: self.clock.now(),
            },
        );
        self.rebalance(doc);

        debug!(
            id,
            count = self.overlays.len(),
            animated = self.animations.contains_key(id),
            "Created overlay"
        );
        Some(node)
    }

    /// Cancel the overlay's animation and timers, then remove its node.
    pub fn remove_overlay(&mut self, doc: &mut Document, id: &str) -> bool {
        self.stop_pulse(id);
        if let Some(handle) = self.removals.remove(id) {
            self.clock.cancel(handle);
        }

        let Some(state) = self.overlays.remove(id) else {
            return false;
        };
        doc.remove(state.node);
        self.rebalance(doc);
        debug!(id, "Removed overlay");
        true
    }

    /// Cancel every pending handle and remove every overlay node.
    pub fn clear_all(&mut self, doc: &mut Document) {
        for (_, handle) in self.animations.drain() {
            self.clock.cancel(handle);
        }
        for (_, handle) in self.removals.drain() {
            self.clock.cancel(handle);
        }
        for (_, state) in std::mem::take(&mut self.overlays) {
            doc.remove(state.node);
        }
        debug!("Cleared all overlays");
    }

    /// Remove `id` after `delay_ms`. Rescheduling replaces the earlier timer.
    pub fn schedule_removal(&mut self, id: &str, delay_ms: u64) -> Option<FrameHandle> {
        if !self.overlays.contains_key(id) {
            return None;
        }
        if let Some(old) = self.removals.remove(id) {
            self.clock.cancel(old);
        }
        let handle = self
            .clock
            .set_timeout(delay_ms, OverlayTask::Remove(id.to_string()));
        self.removals.insert(id.to_string(), handle);
        Some(handle)
    }

    // ------------------------------------------------------------------
    // Updates
    // ------------------------------------------------------------------

    /// Recompute geometry for every overlay. Overlays whose target lost its
    /// geometry are hidden, not removed. Returns how many are hidden.
    pub fn update_all_positions(&mut self, doc: &mut Document) -> usize {
        let mut hidden = 0;
        for (id, state) in self.overlays.iter_mut() {
            match target_rect(doc, state.target) {
                Some(rect) => {
                    state.style.rect = rect;
                    state.style.visible = true;
                }
                None => {
                    if state.style.visible {
                        warn!(id = id.as_str(), "Overlay target is no longer visible");
                    }
                    state.style.visible = false;
                    hidden += 1;
                }
            }
            doc.set_attribute(state.node, "style", &state.style.to_css());
        }
        hidden
    }

    /// Repaint border, background and label in `color` and restart the glow.
    pub fn update_overlay_color(&mut self, doc: &mut Document, id: &str, color: &str) -> bool {
        let Some(state) = self.overlays.get_mut(id) else {
            return false;
        };
        state.options.color = color.to_string();
        state.style.color = color.to_string();
        if let Some(label) = state.label_node {
            doc.set_attribute(label, "style", &label_css(color));
        }

        self.stop_pulse(id);
        self.rebalance(doc);
        true
    }

    /// Advance the frame clock and run every due task.
    pub fn advance(&mut self, doc: &mut Document, now_ms: u64) {
        for task in self.clock.advance(now_ms) {
            match task {
                OverlayTask::Pulse(id) => self.pulse_frame(doc, &id),
                OverlayTask::Remove(id) => {
                    self.removals.remove(&id);
                    self.remove_overlay(doc, &id);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Animation
    // ------------------------------------------------------------------

    /// Animate everything while under the limit, otherwise switch every
    /// overlay to the static glow and cancel all frames.
    fn rebalance(&mut self, doc: &mut Document) {
        let animate = self.overlays.len() <= self.settings.animation_limit;
        let ids: Vec<String> = self.overlays.keys().cloned().collect();

        for id in ids {
            if animate {
                if !self.animations.contains_key(&id) {
                    self.start_pulse(doc, &id);
                }
            } else {
                self.stop_pulse(&id);
                if let Some(state) = self.overlays.get_mut(&id) {
                    state.style.glow = Glow::Static {
                        blur: self.settings.static_blur,
                    };
                    doc.set_attribute(state.node, "style", &state.style.to_css());
                }
            }
        }

        if !animate {
            debug!(
                count = self.overlays.len(),
                limit = self.settings.animation_limit,
                "Overlay animation disabled"
            );
        }
    }

    fn start_pulse(&mut self, doc: &mut Document, id: &str) {
        let now = self.clock.now();
        let Some(state) = self.overlays.get_mut(id) else {
            return;
        };
        state.started_ms = now;
        state.style.glow = Glow::pulse_at(0, self.settings.pulse_period_ms);
        doc.set_attribute(state.node, "style", &state.style.to_css());

        let handle = self.clock.request_frame(OverlayTask::Pulse(id.to_string()));
        self.animations.insert(id.to_string(), handle);
    }

    fn stop_pulse(&mut self, id: &str) {
        if let Some(handle) = self.animations.remove(id) {
            self.clock.cancel(handle);
        }
    }

    fn pulse_frame(&mut self, doc: &mut Document, id: &str) {
        // The handle that fired is spent.
        self.animations.remove(id);

        let now = self.clock.now();
        let Some(state) = self.overlays.get_mut(id) else {
            return;
        };
        if !state.style.glow.is_animated() {
            return;
        }
        let elapsed = now.saturating_sub(state.started_ms);
        state.style.glow = Glow::pulse_at(elapsed, self.settings.pulse_period_ms);
        doc.set_attribute(state.node, "style", &state.style.to_css());

        let handle = self.clock.request_frame(OverlayTask::Pulse(id.to_string()));
        self.animations.insert(id.to_string(), handle);
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Viewport rect for `target`, or for a visible stand-in when the target
/// itself has no geometry (a native control hidden behind a rich editor).
pub fn target_rect(doc: &Document, target: NodeId) -> Option<Rect> {
    if !doc.is_connected(target) {
        return None;
    }
    let rect = doc.bounding_client_rect(target);
    if !rect.is_degenerate() {
        return Some(rect);
    }

    let related = find_visible_related(doc, target)?;
    debug!(target = target.0, related = related.0, "Using related element geometry");
    Some(doc.bounding_client_rect(related))
}

fn find_visible_related(doc: &Document, hidden: NodeId) -> Option<NodeId> {
    let parent = doc.parent_element(hidden)?;

    let editable = doc
        .descendants(parent)
        .into_iter()
        .find(|n| doc.attr(*n, "contenteditable") == Some("true"));
    if let Some(editable) = editable {
        if doc.is_visible(editable) {
            return Some(editable);
        }
    }

    doc.children(parent).into_iter().find(|sibling| {
        *sibling != hidden
            && doc.is_visible(*sibling)
            && (doc.has_class(*sibling, "ProseMirror")
                || doc.has_class(*sibling, "editor")
                || doc.attr(*sibling, "role") == Some("textbox"))
    })
}
