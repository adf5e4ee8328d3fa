//! `gbind options`: JSON options definitions → options artifacts.

use std::path::Path;

use anyhow::{Context, Result};
use gbind_emit::{introspectable_source, options_header, options_source};
use gbind_normalize::{normalize_definitions, OptionsUnit};

use crate::commands::{write_output, OptionsMode};
use crate::config::GbindConfig;

pub fn run(config: &GbindConfig, defs: &Path, mode: OptionsMode, output: Option<&Path>) -> Result<()> {
    let definitions = gbind_extract::defs::load_definitions(defs)
        .with_context(|| format!("loading {}", defs.display()))?;
    let mapper = config.mapper();
    let unit = OptionsUnit {
        enums: Vec::new(),
        structs: normalize_definitions(&definitions, &mapper, &config.normalize)?,
    };
    let rendered = render(config, &unit, mode)?;
    write_output(output, &rendered)
}

/// Render one options artifact of a normalized unit.
pub fn render(config: &GbindConfig, unit: &OptionsUnit, mode: OptionsMode) -> Result<String> {
    Ok(match mode {
        OptionsMode::Header => options_header(unit, &config.output)?,
        OptionsMode::Source => options_source(unit, &config.output)?,
        OptionsMode::IntrospectableSource => introspectable_source(&unit.structs, &config.output)?,
        OptionsMode::DumpDefs => anyhow::bail!("--dump-defs needs header input"),
    })
}
