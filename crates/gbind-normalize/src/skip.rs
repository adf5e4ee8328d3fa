//! Skip policy for function declarations, and the manifest recording it.

use serde::{Deserialize, Serialize};

use gbind_extract::FunctionDecl;
use gbind_types::{MapError, TypeMapper};

use crate::config::NormalizeConfig;
use crate::error::Result;

/// Why a declaration was not bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Leading single underscore.
    Internal,
    DenyListed,
    Ambiguous,
    /// Out-parameter variant duplicating a primary declaration.
    OutVariant,
    UnmappableArgument { argument: String, native_type: String },
    UnmappableReturn { native_type: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Internal => write!(f, "internal"),
            SkipReason::DenyListed => write!(f, "deny-listed"),
            SkipReason::Ambiguous => write!(f, "ambiguous"),
            SkipReason::OutVariant => write!(f, "out variant"),
            SkipReason::UnmappableArgument {
                argument,
                native_type,
            } => write!(f, "takes '{native_type}' as '{argument}'"),
            SkipReason::UnmappableReturn { native_type } => write!(f, "returns '{native_type}'"),
        }
    }
}

/// One skipped declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipRecord {
    pub name: String,
    pub overload_name: String,
    pub reason: SkipReason,
}

/// Every declaration skipped in a run, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipManifest {
    pub skipped: Vec<SkipRecord>,
}

impl SkipManifest {
    pub fn push(&mut self, record: SkipRecord) {
        self.skipped.push(record);
    }

    pub fn len(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }
}

/// Apply the skip policy to `decl`.
///
/// Checks run in order and the first failing one is reported. Only
/// unmappable types count as a mapping skip; an alias cycle in the rule
/// tables is a configuration error and aborts.
pub fn check(
    decl: &FunctionDecl,
    mapper: &TypeMapper,
    config: &NormalizeConfig,
) -> Result<Option<SkipReason>> {
    let name = decl.name.as_str();

    if name.starts_with('_') && !name.starts_with("__") {
        return Ok(Some(SkipReason::Internal));
    }
    if config.skip.deny.iter().any(|d| d == name) {
        return Ok(Some(SkipReason::DenyListed));
    }
    if config.is_ambiguous(name, &decl.overload_name) {
        return Ok(Some(SkipReason::Ambiguous));
    }
    if !config.skip.out_suffix.is_empty() && name.ends_with(config.skip.out_suffix.as_str()) {
        return Ok(Some(SkipReason::OutVariant));
    }

    for ret in &decl.returns {
        if !mappable(mapper, &ret.native_type)? {
            return Ok(Some(SkipReason::UnmappableReturn {
                native_type: ret.native_type.clone(),
            }));
        }
    }
    for arg in &decl.arguments {
        if !mappable(mapper, &arg.native_type)? {
            return Ok(Some(SkipReason::UnmappableArgument {
                argument: arg.name.clone(),
                native_type: arg.native_type.clone(),
            }));
        }
    }
    Ok(None)
}

fn mappable(mapper: &TypeMapper, native: &str) -> Result<bool> {
    match mapper.resolve(native, None) {
        Ok(_) => Ok(true),
        Err(MapError::UnmappableType { .. } | MapError::InvalidNativeType { .. }) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Log a skip at the level its reason deserves.
pub fn log_skip(record: &SkipRecord) {
    match record.reason {
        SkipReason::Internal | SkipReason::OutVariant => tracing::debug!(
            name = %record.name,
            overload = %record.overload_name,
            reason = %record.reason,
            "skipped declaration"
        ),
        _ => tracing::warn!(
            name = %record.name,
            overload = %record.overload_name,
            reason = %record.reason,
            "skipped declaration"
        ),
    }
}
