use crate::dom::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scroll,
    Resize,
}

/// Where an event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Window,
    Element(NodeId),
}

/// Which component a listener belongs to. The hub reports subscribers; the
/// page context routes the event to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscriber {
    OverlayPositions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone)]
struct Listener {
    id: ListenerId,
    kind: EventKind,
    capture: bool,
    subscriber: Subscriber,
}

/// Window-level event listeners.
///
/// Scroll events from nested scroll containers do not bubble, so they reach
/// only listeners registered for the capture phase.
#[derive(Debug, Default)]
pub struct EventHub {
    next_id: u64,
    listeners: Vec<Listener>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(
        &mut self,
        kind: EventKind,
        subscriber: Subscriber,
        capture: bool,
    ) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push(Listener {
            id,
            kind,
            capture,
            subscriber,
        });
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Subscribers to notify, in registration order, one entry per listener.
    pub fn dispatch(&self, kind: EventKind, target: EventTarget) -> Vec<Subscriber> {
        self.listeners
            .iter()
            .filter(|l| l.kind == kind)
            .filter(|l| match target {
                EventTarget::Window => true,
                EventTarget::Element(_) => l.capture,
            })
            .map(|l| l.subscriber)
            .collect()
    }
}
