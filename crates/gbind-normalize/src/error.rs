//! Normalization error types.
//!
//! Unmappable function declarations are skipped, not errors. Options
//! structs cannot drop a field, so an unmappable field is fatal.

use gbind_types::MapError;

/// Errors that abort normalization.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    /// A type mapping failure that is not recoverable by skipping.
    #[error(transparent)]
    Map(#[from] MapError),

    /// A field of an options struct has no type rule.
    #[error("field '{field}' of options struct '{structure}' has unmappable type '{native}'")]
    UnmappableField {
        structure: String,
        field: String,
        native: String,
    },

    /// The declared parent of an options struct does not exist.
    #[error("options struct '{structure}' derives from unknown options struct '{parent}'")]
    UnknownParent { structure: String, parent: String },

    /// Options structs derive from each other in a cycle.
    #[error("inheritance cycle through options struct '{structure}'")]
    InheritanceCycle { structure: String },

    /// A native constructor argument names no field.
    #[error("constructor of options struct '{structure}' takes unknown field '{arg}'")]
    UnknownConstructorArg { structure: String, arg: String },
}

/// Result type alias for normalization operations.
pub type Result<T> = std::result::Result<T, NormalizeError>;
