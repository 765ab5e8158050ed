pub mod config_store;

pub use config_store::{config_fingerprint, ConfigStore, StoredConfig};
