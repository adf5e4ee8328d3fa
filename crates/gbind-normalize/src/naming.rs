//! Bindable function names.

use gbind_extract::FunctionDecl;

use crate::config::NormalizeConfig;

/// Assemble the bindable name of a (possibly expanded) declaration.
///
/// `prefix [receiver-marker] [op] base [overload_name] [overload] [inplace]`,
/// empty components omitted, joined with underscores.
pub fn bindable_name(decl: &FunctionDecl, overload: Option<&str>, config: &NormalizeConfig) -> String {
    let marker = config
        .receiver_for(&decl.method_of)
        .map_or("", |r| r.marker.as_str());
    let native = native_part(decl, overload, config);
    join([config.naming.prefix.as_str(), marker, native.as_str()])
}

/// The part of the name derived from the native declaration alone.
pub fn native_part(decl: &FunctionDecl, overload: Option<&str>, config: &NormalizeConfig) -> String {
    let name = decl.name.as_str();
    let op = if name.starts_with("__") { "op" } else { "" };
    let inplace = if is_inplace(name) { "inplace" } else { "" };
    let base = config
        .naming
        .renames
        .get(name)
        .map_or(name, String::as_str)
        .trim_matches('_');
    let overload_name = decl.overload_name.to_lowercase();
    let overload = overload.unwrap_or("").to_lowercase();
    join([op, base, overload_name.as_str(), overload.as_str(), inplace])
}

/// A single trailing underscore marks an in-place variant; operator names
/// (`__iand__`) do not count.
pub fn is_inplace(name: &str) -> bool {
    name.ends_with('_') && !name.ends_with("__")
}

fn join<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}
