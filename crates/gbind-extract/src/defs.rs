//! JSON options definitions.
//!
//! Each record describes one options struct directly in target terms: the
//! C type of every field, how it converts to the native options object,
//! and which fields the native constructor takes. Header scanning produces
//! the same records, so both inputs share normalization and emission.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

/// One options struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionsDefinition {
    /// Name without the type prefix (`NNLinearOptions`).
    pub name: String,
    /// Native options type (`torch::nn::LinearOptions`).
    pub cpp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpp_constructor: Option<CppConstructor>,
    #[serde(default)]
    pub opts: Vec<OptionDef>,
}

/// Fields passed to the native constructor, by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CppConstructor {
    pub args: Vec<String>,
}

/// One options field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionDef {
    pub name: String,
    pub c_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpp_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "OptionMeta::is_empty")]
    pub meta: OptionMeta,
}

impl OptionDef {
    /// Whether the field holds a callback with user data.
    pub fn is_callback(&self) -> bool {
        self.meta.func_data_ptr.is_some()
    }

    pub fn is_pointer(&self) -> bool {
        self.c_type.contains('*')
    }
}

/// Conversion metadata of a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionMeta {
    /// Element or value type (`int64_t`, `double`, `GType`).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<LengthSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func_data_ptr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub func_data_ptr_destroy: Option<String>,
    /// Callback arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<CallbackArgDef>,
    /// Callback return value.
    #[serde(rename = "return", default, skip_serializing_if = "Option::is_none")]
    pub ret: Option<CallbackArgDef>,
    /// `{name}` templates applied left to right.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub convert_pipeline: Vec<String>,
    /// Callback function-pointer type for the closure wrapper.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Any other key (`dims`, ...), available to templates.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl OptionMeta {
    pub fn is_empty(&self) -> bool {
        *self == OptionMeta::default()
    }

    /// Flatten into string metadata for `{meta[key]}` templates.
    pub fn template_meta(&self) -> BTreeMap<String, String> {
        let mut meta = BTreeMap::new();
        for (key, value) in &self.extra {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            meta.insert(key.clone(), text);
        }
        if let Some(t) = &self.value_type {
            meta.insert("type".to_string(), t.clone());
        }
        if let Some(len) = &self.length {
            meta.insert("length".to_string(), len.to_string());
        }
        if let Some(sig) = &self.signature {
            meta.insert("signature".to_string(), sig.clone());
        }
        meta
    }
}

/// Array length: a literal, or the name of a length field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LengthSpec {
    Fixed(u64),
    Named(String),
}

impl LengthSpec {
    /// The length parameter name, when the length is not a literal.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            LengthSpec::Fixed(_) => None,
            LengthSpec::Named(n) if n.parse::<u64>().is_ok() => None,
            LengthSpec::Named(n) => Some(n),
        }
    }
}

impl fmt::Display for LengthSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthSpec::Fixed(n) => write!(f, "{n}"),
            LengthSpec::Named(n) => f.write_str(n),
        }
    }
}

/// A callback argument or return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackArgDef {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub c_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cpp_type: String,
    /// Explicit `{name}` conversion template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convert: Option<String>,
}

/// Parse and validate an options definitions document.
pub fn parse_definitions(input: &str) -> Result<Vec<OptionsDefinition>> {
    let defs: Vec<OptionsDefinition> = serde_json::from_str(input)?;
    validate(&defs)?;
    tracing::debug!(count = defs.len(), "parsed options definitions");
    Ok(defs)
}

/// Load and parse an options definitions document from disk.
pub fn load_definitions(path: &std::path::Path) -> Result<Vec<OptionsDefinition>> {
    let content = std::fs::read_to_string(path)?;
    parse_definitions(&content)
}

/// Pretty JSON, in the same shape [`parse_definitions`] reads.
pub fn to_json_pretty(defs: &[OptionsDefinition]) -> Result<String> {
    let mut out = serde_json::to_string_pretty(defs)?;
    out.push('\n');
    Ok(out)
}

fn validate(defs: &[OptionsDefinition]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for def in defs {
        if def.name.trim().is_empty() {
            return Err(invalid("options struct with an empty name".to_string()));
        }
        if !seen.insert(def.name.as_str()) {
            return Err(invalid(format!("options struct '{}' defined twice", def.name)));
        }

        let mut fields = BTreeSet::new();
        for opt in &def.opts {
            if opt.name.trim().is_empty() || opt.c_type.trim().is_empty() {
                return Err(invalid(format!(
                    "field of '{}' needs both a name and a c_type",
                    def.name
                )));
            }
            if !fields.insert(opt.name.as_str()) {
                return Err(invalid(format!(
                    "field '{}' of '{}' defined twice",
                    opt.name, def.name
                )));
            }
            if opt.meta.func_data_ptr_destroy.is_some() && opt.meta.func_data_ptr.is_none() {
                return Err(invalid(format!(
                    "field '{}' of '{}' has a destroy notify without user data",
                    opt.name, def.name
                )));
            }
        }
    }
    Ok(())
}

fn invalid(detail: String) -> ExtractError {
    ExtractError::InvalidDefinitions { detail }
}
