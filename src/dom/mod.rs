pub mod document;
pub mod layout;
pub mod parser;
pub mod selector;
pub mod snapshot;

pub use document::{Document, NodeId};
pub use layout::{Point, Rect, Size};
pub use selector::Selector;
pub use snapshot::PageSnapshot;
