//! Whole-file assembly: includes, declaration guards, entries in input order.

use std::fmt::Write;

use gbind_normalize::{CanonicalSignature, OptionsStruct, OptionsUnit};

use crate::config::{include_line, OutputConfig};
use crate::error::Result;
use crate::{function, options};

fn write_includes(out: &mut String, includes: &[String]) -> Result<()> {
    for entry in includes {
        writeln!(out, "{}", include_line(entry))?;
    }
    Ok(())
}

/// Functions header: one prototype per signature between declaration guards.
pub fn functions_header(sigs: &[CanonicalSignature], config: &OutputConfig) -> Result<String> {
    let mut out = String::new();
    write_includes(&mut out, &config.header_includes)?;
    writeln!(out)?;
    writeln!(out, "G_BEGIN_DECLS")?;
    for sig in sigs {
        writeln!(out)?;
        writeln!(out, "{};", function::forward_declaration(sig))?;
    }
    writeln!(out)?;
    writeln!(out, "G_END_DECLS")?;
    tracing::info!(functions = sigs.len(), "rendered functions header");
    Ok(out)
}

/// Functions source: documented definitions after the preamble.
pub fn functions_source(sigs: &[CanonicalSignature], config: &OutputConfig) -> Result<String> {
    let mut out = String::new();
    write_includes(&mut out, &config.source_includes)?;
    writeln!(out)?;
    for line in &config.source_preamble {
        writeln!(out, "{line}")?;
    }
    for sig in sigs {
        let emitted = function::emit(sig)?;
        writeln!(out)?;
        writeln!(out, "{}", emitted.source_entry())?;
    }
    tracing::info!(functions = sigs.len(), "rendered functions source");
    Ok(out)
}

/// Options header: generated enums first, then structs.
pub fn options_header(unit: &OptionsUnit, config: &OutputConfig) -> Result<String> {
    let mut out = String::new();
    write_includes(&mut out, &config.options_header_includes)?;
    writeln!(out)?;
    writeln!(out, "G_BEGIN_DECLS")?;
    for e in &unit.enums {
        writeln!(out, "{}", options::enum_header(e))?;
    }
    for s in &unit.structs {
        writeln!(out, "{}", options::struct_header(s))?;
    }
    writeln!(out)?;
    writeln!(out, "G_END_DECLS")?;
    tracing::info!(enums = unit.enums.len(), structs = unit.structs.len(), "rendered options header");
    Ok(out)
}

/// Options source: enum converters, then one `struct_to_options` per struct.
pub fn options_source(unit: &OptionsUnit, config: &OutputConfig) -> Result<String> {
    let mut out = String::new();
    write_includes(&mut out, &config.options_source_includes)?;
    for e in &unit.enums {
        writeln!(out, "{}", options::enum_converter(e))?;
    }
    for s in &unit.structs {
        writeln!(out, "{}", options::struct_to_options(s)?)?;
    }
    tracing::info!(enums = unit.enums.len(), structs = unit.structs.len(), "rendered options source");
    Ok(out)
}

/// Constructors, copies, destructors and boxed types of every struct.
pub fn introspectable_source(structs: &[OptionsStruct], config: &OutputConfig) -> Result<String> {
    let mut out = String::new();
    write_includes(&mut out, &config.introspectable_includes)?;
    for s in structs {
        writeln!(out, "{}", options::introspectable_source(s)?)?;
    }
    tracing::info!(structs = structs.len(), "rendered introspectable source");
    Ok(out)
}
