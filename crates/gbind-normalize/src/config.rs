//! Normalization settings.
//!
//! Every section deserializes with defaults, so an empty configuration
//! reproduces the built-in tensor API conventions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// All normalization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub naming: NamingConfig,
    pub skip: SkipConfig,
    pub namespaces: NamespaceConfig,
    pub receivers: Vec<ReceiverConfig>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            naming: NamingConfig::default(),
            skip: SkipConfig::default(),
            namespaces: NamespaceConfig::default(),
            receivers: vec![ReceiverConfig {
                native: "Tensor".to_string(),
                marker: "tensor".to_string(),
                init: Some("torch_tensor_init_internal".to_string()),
            }],
        }
    }
}

/// Prefixes and renames used when building bindable names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Function name prefix (`torch`).
    pub prefix: String,
    /// Type name prefix (`Torch`).
    pub type_prefix: String,
    /// Options struct and generated enum prefix (`TorchNN`).
    pub options_prefix: String,
    /// Native names replaced before the bindable name is assembled.
    pub renames: BTreeMap<String, String>,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            prefix: "torch".to_string(),
            type_prefix: "Torch".to_string(),
            options_prefix: "TorchNN".to_string(),
            renames: BTreeMap::from([(
                "set_data".to_string(),
                "set_data_from_tensor".to_string(),
            )]),
        }
    }
}

/// Which declarations are never bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipConfig {
    /// Names whose declarations are known to be broken.
    pub deny: Vec<String>,
    /// Overloads that cannot be told apart once bound.
    pub ambiguous: Vec<OverloadRef>,
    /// Name suffix of out-parameter variants.
    pub out_suffix: String,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            deny: vec![
                "data".to_string(),
                "polygamma".to_string(),
                "special_polygamma".to_string(),
            ],
            ambiguous: vec![OverloadRef {
                name: "count_nonzero".to_string(),
                overload_name: String::new(),
            }],
            out_suffix: "_out".to_string(),
        }
    }
}

/// A declaration name plus overload discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverloadRef {
    pub name: String,
    #[serde(default)]
    pub overload_name: String,
}

/// Namespace used for free-function calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceConfig {
    pub default: String,
    pub overrides: Vec<NamespaceOverride>,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            default: "torch".to_string(),
            overrides: vec![NamespaceOverride {
                name: "normal".to_string(),
                overloads: vec![
                    "Tensor_float".to_string(),
                    "float_Tensor".to_string(),
                    "Tensor_Tensor".to_string(),
                ],
                namespace: "at".to_string(),
            }],
        }
    }
}

impl NamespaceConfig {
    /// Namespace for calling `name` with overload `overload_name`.
    pub fn for_call(&self, name: &str, overload_name: &str) -> &str {
        self.overrides
            .iter()
            .find(|o| o.name == name && o.overloads.iter().any(|ov| ov == overload_name))
            .map_or(self.default.as_str(), |o| o.namespace.as_str())
    }
}

/// Overloads of `name` that must be called in `namespace`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceOverride {
    pub name: String,
    #[serde(default)]
    pub overloads: Vec<String>,
    pub namespace: String,
}

/// A receiver type of instance methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Tag in `method_of` naming the receiver type.
    pub native: String,
    /// Name component contributed to bindable names.
    pub marker: String,
    /// Function checking the receiver's lazily initialized state.
    #[serde(default)]
    pub init: Option<String>,
}

impl NormalizeConfig {
    /// The receiver type a `method_of` tag set names, if any.
    pub fn receiver_for(&self, method_of: &[String]) -> Option<&ReceiverConfig> {
        self.receivers
            .iter()
            .find(|r| method_of.iter().any(|m| *m == r.native))
    }

    /// Whether `name`/`overload_name` is listed as ambiguous.
    pub fn is_ambiguous(&self, name: &str, overload_name: &str) -> bool {
        self.skip
            .ambiguous
            .iter()
            .any(|a| a.name == name && a.overload_name == overload_name)
    }
}
