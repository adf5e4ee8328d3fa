//! Emission error types.

/// Errors that can occur while rendering C sources.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// A canonical signature or struct has a shape emission cannot express.
    #[error("cannot emit '{name}': {detail}")]
    Invariant { name: String, detail: String },

    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
}

/// Result type alias for emission operations.
pub type Result<T> = std::result::Result<T, EmitError>;
