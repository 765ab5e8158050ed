//! Re-locate user-chosen form elements on pages whose markup churns between
//! visits.
//!
//! A page is scanned into element descriptors, the user keeps some of them as
//! a saved configuration, and on a later visit every saved entry is resolved
//! again through a chain of fallback strategies. Overlays mark what was found.

pub mod channel;
pub mod cli;
pub mod dom;
pub mod error;
pub mod overlay;
pub mod page;
pub mod report;
pub mod resolve;
pub mod screen;
pub mod store;

pub use error::{ChannelError, PageError, SelectorError, StoreError};
