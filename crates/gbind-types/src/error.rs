//! Type mapping error types.

/// Errors that can occur while resolving native types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// No context-free and no context-specific rule applies.
    #[error("no type rule for '{native}'{}", context_suffix(.context))]
    UnmappableType {
        native: String,
        context: Option<String>,
    },

    /// The native type spelling could not be shaped.
    #[error("invalid native type: {detail}")]
    InvalidNativeType { detail: String },

    /// A chain of type aliases refers back to itself.
    #[error("type alias cycle through '{name}'")]
    AliasCycle { name: String },
}

fn context_suffix(context: &Option<String>) -> String {
    match context {
        Some(ctx) => format!(" in context '{ctx}'"),
        None => String::new(),
    }
}

/// Result type alias for type mapping operations.
pub type Result<T> = std::result::Result<T, MapError>;
