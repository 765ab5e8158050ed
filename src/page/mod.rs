pub mod context;
pub mod events;
pub mod message;

pub use context::{ContextSettings, HighlightColors, HighlightSettings, OverlayInfo, PageContext};
pub use events::{EventHub, EventKind, EventTarget};
pub use message::{Message, Request, Response};
