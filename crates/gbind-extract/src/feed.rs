//! Structured declarations feed (YAML).
//!
//! The feed is a sequence of records, one per native function or method
//! overload. Only the fields needed for binding are projected; everything
//! else in a record is ignored.

use serde::Deserialize;

use crate::decl::{ArgumentDecl, FunctionDecl, RawDeclaration, ReturnDecl};
use crate::error::{ExtractError, Result};

#[derive(Debug, Deserialize)]
struct FeedRecord {
    name: String,
    #[serde(default)]
    overload_name: String,
    #[serde(default)]
    method_of: Vec<String>,
    #[serde(default)]
    arguments: Vec<FeedArgument>,
    #[serde(default)]
    schema_order_arguments: Vec<FeedArgument>,
    #[serde(default)]
    returns: Vec<FeedReturn>,
}

#[derive(Debug, Deserialize)]
struct FeedArgument {
    name: String,
    dynamic_type: String,
    #[serde(rename = "type", default)]
    spelled: String,
    #[serde(default)]
    is_nullable: bool,
    #[serde(default)]
    size: Option<usize>,
    #[serde(default)]
    annotation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FeedReturn {
    #[serde(default)]
    name: String,
    dynamic_type: String,
    #[serde(rename = "type", default)]
    spelled: String,
}

impl From<FeedArgument> for ArgumentDecl {
    fn from(a: FeedArgument) -> Self {
        let spelled_type = if a.spelled.is_empty() {
            a.dynamic_type.clone()
        } else {
            a.spelled
        };
        ArgumentDecl {
            name: a.name,
            native_type: a.dynamic_type,
            spelled_type,
            nullable: a.is_nullable,
            size: a.size,
            annotation: a.annotation,
        }
    }
}

impl From<FeedReturn> for ReturnDecl {
    fn from(r: FeedReturn) -> Self {
        let spelled_type = if r.spelled.is_empty() {
            r.dynamic_type.clone()
        } else {
            r.spelled
        };
        ReturnDecl {
            name: r.name,
            native_type: r.dynamic_type,
            spelled_type,
        }
    }
}

/// Parse a declarations feed into function declarations, in feed order.
pub fn parse_feed(input: &str) -> Result<Vec<RawDeclaration>> {
    let records: Vec<FeedRecord> = serde_yaml::from_str(input)?;
    let mut decls = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        if record.name.trim().is_empty() {
            return Err(ExtractError::InvalidFeed {
                detail: format!("record {index} has an empty name"),
            });
        }
        if let Some(arg) = record.arguments.iter().find(|a| a.dynamic_type.trim().is_empty()) {
            return Err(ExtractError::InvalidFeed {
                detail: format!(
                    "argument '{}' of '{}' has no type",
                    arg.name, record.name
                ),
            });
        }

        decls.push(RawDeclaration::Function(FunctionDecl {
            name: record.name,
            overload_name: record.overload_name,
            method_of: record.method_of,
            arguments: record.arguments.into_iter().map(Into::into).collect(),
            schema_order_arguments: record
                .schema_order_arguments
                .into_iter()
                .map(Into::into)
                .collect(),
            returns: record.returns.into_iter().map(Into::into).collect(),
        }));
    }

    tracing::debug!(count = decls.len(), "parsed declarations feed");
    Ok(decls)
}

/// Load and parse a declarations feed from disk.
pub fn load_feed(path: &std::path::Path) -> Result<Vec<RawDeclaration>> {
    let content = std::fs::read_to_string(path)?;
    parse_feed(&content)
}
