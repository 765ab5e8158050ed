pub mod classifier;
pub mod container;
pub mod descriptor;
pub mod scanner;
pub mod selector_path;
pub mod stability;

pub use classifier::classify;
pub use descriptor::{ElementDescriptor, ElementType, SavedConfigEntry};
pub use scanner::{ElementScanner, ScannedElement};
pub use selector_path::{generate_stable_selector, SelectorPathBuilder};
pub use stability::StabilityPolicy;
