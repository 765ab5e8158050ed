pub mod replica;
pub mod resolver;
pub mod strategy;

pub use replica::{generate_replica, ReplicaLayoutEntry};
pub use resolver::{extract_value, ElementRef, ElementResolver, ExtractResult, Resolution};
pub use strategy::{FoundBy, Strategy};
