use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::screen::SavedConfigEntry;

// ============================================================================
// On-disk format
// ============================================================================

/// `{savedConfig, timestamp, checksum}` as written to the store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredConfig {
    #[serde(default)]
    pub saved_config: Vec<SavedConfigEntry>,
    /// Milliseconds since the Unix epoch at the last write.
    #[serde(default)]
    pub timestamp: i64,
    /// SHA-1 of the compact JSON of `saved_config`; absent in hand-written files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// Stable fingerprint of a configuration: SHA-1 over its compact JSON.
pub fn config_fingerprint(entries: &[SavedConfigEntry]) -> Result<String, StoreError> {
    use sha1::{Digest, Sha1};

    let json = serde_json::to_string(entries)?;
    let mut hasher = Sha1::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Store
// ============================================================================

/// The saved configuration, persisted as a single JSON file.
///
/// Every mutation is written through immediately; there is no batching.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    entries: Vec<SavedConfigEntry>,
    timestamp: i64,
}

impl ConfigStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config store yet");
                return Ok(ConfigStore {
                    path,
                    entries: Vec::new(),
                    timestamp: 0,
                });
            }
            Err(source) => return Err(io_error(&path, source)),
        };

        let stored: StoredConfig = serde_json::from_str(&content)?;
        if let Some(expected) = &stored.checksum {
            let actual = config_fingerprint(&stored.saved_config)?;
            if *expected != actual {
                return Err(StoreError::Checksum {
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        info!(
            path = %path.display(),
            entries = stored.saved_config.len(),
            "Loaded saved configuration"
        );
        Ok(ConfigStore {
            path,
            entries: stored.saved_config,
            timestamp: stored.timestamp,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[SavedConfigEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time of the last write, in Unix milliseconds (0 if never written).
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Replace the whole configuration.
    pub fn save(&mut self, entries: Vec<SavedConfigEntry>) -> Result<(), StoreError> {
        self.entries = entries;
        self.persist()
    }

    /// Remove the entry at `position` and return it.
    pub fn delete(&mut self, position: usize) -> Result<SavedConfigEntry, StoreError> {
        if position >= self.entries.len() {
            return Err(StoreError::NoSuchEntry(position));
        }
        let removed = self.entries.remove(position);
        self.persist()?;
        Ok(removed)
    }

    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.entries.clear();
        self.persist()
    }

    /// Pretty-printed JSON array of the entries.
    pub fn export_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Replace the configuration with an exported array.
    ///
    /// Anything other than a JSON array is rejected and the store is left
    /// untouched.
    pub fn import_json(&mut self, json: &str) -> Result<usize, StoreError> {
        let value: Value = serde_json::from_str(json)?;
        if !value.is_array() {
            warn!("Rejected import: not a JSON array");
            return Err(StoreError::NotAnArray);
        }
        let entries: Vec<SavedConfigEntry> = serde_json::from_value(value)?;
        let count = entries.len();
        self.save(entries)?;
        Ok(count)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        self.timestamp = chrono::Utc::now().timestamp_millis();
        let stored = StoredConfig {
            checksum: Some(config_fingerprint(&self.entries)?),
            saved_config: self.entries.clone(),
            timestamp: self.timestamp,
        };
        let json = serde_json::to_string_pretty(&stored)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_error(&self.path, e))?;
        }
        std::fs::write(&self.path, json).map_err(|e| io_error(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            entries = self.entries.len(),
            "Persisted configuration"
        );
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}
