//! Target ABI type spellings.

use serde::{Deserialize, Serialize};

/// A C type spelling on the binding side, e.g. `TorchTensor *` or `gboolean`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetType(String);

impl TargetType {
    pub fn new(spelling: impl Into<String>) -> Self {
        Self(spelling.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the type is pointer-shaped.
    pub fn is_pointer(&self) -> bool {
        self.0.contains('*')
    }

    /// One more level of indirection: `T` → `T *`, `T *` → `T **`.
    pub fn pointer_to(&self) -> TargetType {
        if self.0.ends_with('*') {
            TargetType(format!("{}*", self.0))
        } else {
            TargetType(format!("{} *", self.0))
        }
    }

    /// One less level of indirection: `T **` → `T *`, `T *` → `T`.
    pub fn pointee(&self) -> TargetType {
        match self.0.strip_suffix('*') {
            Some(rest) => TargetType(rest.trim_end().to_string()),
            None => self.clone(),
        }
    }

    /// The underlying type name without `const` and pointer markers.
    ///
    /// Used for `g_autoptr (Name)` cleanup declarations.
    pub fn base_name(&self) -> String {
        self.0
            .split_whitespace()
            .filter(|tok| *tok != "const")
            .map(|tok| tok.trim_matches('*'))
            .filter(|tok| !tok.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The same type with a leading `const` qualifier.
    pub fn as_const(&self) -> TargetType {
        if self.0.starts_with("const ") {
            self.clone()
        } else {
            TargetType(format!("const {}", self.0))
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetType {
    fn from(s: &str) -> Self {
        TargetType::new(s)
    }
}

impl From<String> for TargetType {
    fn from(s: String) -> Self {
        TargetType::new(s)
    }
}
