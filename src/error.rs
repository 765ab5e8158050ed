use thiserror::Error;

/// A selector string the engine cannot parse.
///
/// Resolution treats this as a miss for the strategy that produced it, never
/// as a failure of the whole request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unsupported selector '{selector}': {reason}")]
    Unsupported { selector: String, reason: String },
}

impl SelectorError {
    pub(crate) fn unsupported(selector: &str, reason: impl Into<String>) -> Self {
        SelectorError::Unsupported {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures raised inside the page context while decoding a page or a request.
#[derive(Debug, Error)]
pub enum PageError {
    /// HTML input could not be turned into a document
    #[error("HTML parse error: {0}")]
    HtmlParse(String),

    /// JSON parsing failed (page snapshot or request envelope)
    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Request referred to a node id that is not a connected element
    #[error("no element with node id {0}")]
    NoSuchNode(usize),

    /// Request type is not one of the exposed operations
    #[error("Unknown message type: {0}")]
    UnknownMessage(String),

    /// Request payload did not match the operation's shape
    #[error("invalid payload for {message}: {source}")]
    Payload {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Response could not be encoded
    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of the cross-context request/response channel.
///
/// Any of these fails the whole call; the caller decides whether to retry.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Page-context process failed to spawn
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the channel failed
    #[error("channel I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The page context went away (closed pipe, navigated, destroyed)
    #[error("page context destroyed: {0}")]
    ContextDestroyed(String),

    /// A request or response was not valid JSON
    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The page context answered with `{error}`
    #[error("{message} failed in page context: {error}")]
    Remote { message: String, error: String },
}

/// Failures of the persisted configuration store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access config store {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("imported configuration must be a JSON array")]
    NotAnArray,

    #[error("config store checksum mismatch (expected {expected}, found {actual})")]
    Checksum { expected: String, actual: String },

    #[error("no saved entry at position {0}")]
    NoSuchEntry(usize),
}
