use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::dom::{NodeId, PageSnapshot};
use crate::error::PageError;
use crate::screen::descriptor::SavedConfigEntry;

// ============================================================================
// Envelope
// ============================================================================

pub const SCAN_ALL: &str = "SCAN_ALL";
pub const SAVE_BY_INDEXES: &str = "SAVE_BY_INDEXES";
pub const EXTRACT_BY_CONFIG: &str = "EXTRACT_BY_CONFIG";
pub const GENERATE_REPLICA_DATA: &str = "GENERATE_REPLICA_DATA";
pub const HIGHLIGHT_BY_INDEX: &str = "HIGHLIGHT_BY_INDEX";
pub const HIGHLIGHT_BY_CONFIG_ENTRY: &str = "HIGHLIGHT_BY_CONFIG_ENTRY";
pub const CLEAR_HIGHLIGHT: &str = "CLEAR_HIGHLIGHT";
pub const LOAD_PAGE: &str = "LOAD_PAGE";
pub const SCROLL: &str = "SCROLL";
pub const RESIZE: &str = "RESIZE";
pub const TICK: &str = "TICK";
pub const GET_OVERLAYS: &str = "GET_OVERLAYS";

/// `{type, payload}` as exchanged with the page context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Message {
    pub fn new(kind: &str, payload: Value) -> Self {
        Message {
            kind: kind.to_string(),
            payload,
        }
    }

    pub fn bare(kind: &str) -> Self {
        Self::new(kind, Value::Null)
    }

    pub fn scan_all() -> Self {
        Self::bare(SCAN_ALL)
    }

    pub fn save_by_indexes(indexes: &[usize]) -> Self {
        Self::new(SAVE_BY_INDEXES, json!({ "indexes": indexes }))
    }

    pub fn extract_by_config(config: &[SavedConfigEntry]) -> Self {
        Self::new(EXTRACT_BY_CONFIG, json!({ "config": config }))
    }

    pub fn generate_replica_data(config: &[SavedConfigEntry]) -> Self {
        Self::new(GENERATE_REPLICA_DATA, json!({ "config": config }))
    }

    pub fn highlight_by_index(index: usize) -> Self {
        Self::new(HIGHLIGHT_BY_INDEX, json!({ "index": index }))
    }

    pub fn highlight_by_config_entry(config_index: usize, entry: &SavedConfigEntry) -> Self {
        Self::new(
            HIGHLIGHT_BY_CONFIG_ENTRY,
            json!({ "configIndex": config_index, "config": entry }),
        )
    }

    pub fn clear_highlight() -> Self {
        Self::bare(CLEAR_HIGHLIGHT)
    }

    pub fn load_page(snapshot: &PageSnapshot) -> Self {
        Self::new(LOAD_PAGE, json!(snapshot))
    }
}

// ============================================================================
// Decoded requests
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct IndexesPayload {
    #[serde(default)]
    indexes: Vec<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPayload {
    #[serde(default)]
    config: Vec<SavedConfigEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct IndexPayload {
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigEntryPayload {
    #[serde(default)]
    config_index: usize,
    config: SavedConfigEntry,
}

/// Scroll the window, or the element `node` when present.
///
/// `node` is the same live handle an `ExtractResult` carries in
/// `element.node`. It is not a document-order index like the ones in a
/// `PageSnapshot` layout, which only apply while the snapshot is loaded.
#[derive(Debug, Deserialize)]
pub struct ScrollPayload {
    #[serde(default)]
    pub node: Option<NodeId>,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Deserialize)]
pub struct ResizePayload {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Deserialize)]
struct TickPayload {
    now: u64,
}

#[derive(Debug)]
pub enum Request {
    ScanAll,
    SaveByIndexes(Vec<usize>),
    ExtractByConfig(Vec<SavedConfigEntry>),
    GenerateReplicaData(Vec<SavedConfigEntry>),
    HighlightByIndex(usize),
    HighlightByConfigEntry {
        config_index: usize,
        entry: Box<SavedConfigEntry>,
    },
    ClearHighlight,
    LoadPage(Box<PageSnapshot>),
    Scroll(ScrollPayload),
    Resize(ResizePayload),
    Tick(u64),
    GetOverlays,
}

impl Request {
    pub fn from_message(message: &Message) -> Result<Self, PageError> {
        let kind = message.kind.as_str();
        Ok(match kind {
            SCAN_ALL => Request::ScanAll,
            SAVE_BY_INDEXES => {
                Request::SaveByIndexes(lenient::<IndexesPayload>(kind, &message.payload)?.indexes)
            }
            EXTRACT_BY_CONFIG => {
                Request::ExtractByConfig(lenient::<ConfigPayload>(kind, &message.payload)?.config)
            }
            GENERATE_REPLICA_DATA => Request::GenerateReplicaData(
                lenient::<ConfigPayload>(kind, &message.payload)?.config,
            ),
            HIGHLIGHT_BY_INDEX => {
                Request::HighlightByIndex(lenient::<IndexPayload>(kind, &message.payload)?.index)
            }
            HIGHLIGHT_BY_CONFIG_ENTRY => {
                let payload: ConfigEntryPayload = strict(kind, &message.payload)?;
                Request::HighlightByConfigEntry {
                    config_index: payload.config_index,
                    entry: Box::new(payload.config),
                }
            }
            CLEAR_HIGHLIGHT => Request::ClearHighlight,
            LOAD_PAGE => Request::LoadPage(Box::new(strict(kind, &message.payload)?)),
            SCROLL => Request::Scroll(strict(kind, &message.payload)?),
            RESIZE => Request::Resize(strict(kind, &message.payload)?),
            TICK => Request::Tick(strict::<TickPayload>(kind, &message.payload)?.now),
            GET_OVERLAYS => Request::GetOverlays,
            other => return Err(PageError::UnknownMessage(other.to_string())),
        })
    }
}

/// Missing payloads decode as the empty default.
fn lenient<T: DeserializeOwned + Default>(kind: &str, payload: &Value) -> Result<T, PageError> {
    if payload.is_null() {
        return Ok(T::default());
    }
    strict(kind, payload)
}

fn strict<T: DeserializeOwned>(kind: &str, payload: &Value) -> Result<T, PageError> {
    T::deserialize(payload).map_err(|source| PageError::Payload {
        message: kind.to_string(),
        source,
    })
}

// ============================================================================
// Responses
// ============================================================================

/// Either the operation's JSON result or `{error}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok(Value),
    Error(String),
}

impl Response {
    pub fn into_json(self) -> Value {
        match self {
            Response::Ok(value) => value,
            Response::Error(error) => json!({ "error": error }),
        }
    }

    /// Split a raw reply back into a response.
    pub fn from_json(value: Value) -> Self {
        match value.get("error").and_then(Value::as_str) {
            Some(error) => Response::Error(error.to_string()),
            None => Response::Ok(value),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}
