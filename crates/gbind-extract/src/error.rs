//! Extraction error types.
//!
//! Malformed header text is not an error: the header scanner skips what it
//! cannot recognize. Only structured inputs fail.

/// Errors that can occur while reading declaration inputs.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The declarations feed has the right syntax but an unusable record.
    #[error("invalid declarations feed: {detail}")]
    InvalidFeed { detail: String },

    /// The options definitions document has an unusable record.
    #[error("invalid options definitions: {detail}")]
    InvalidDefinitions { detail: String },

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
