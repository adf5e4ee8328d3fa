//! `gbind functions`: declarations feed → header or marshalling source.

use std::path::Path;

use anyhow::{Context, Result};
use gbind_emit::{functions_header, functions_source};
use gbind_normalize::normalize_functions;

use crate::commands::write_output;
use crate::config::GbindConfig;

/// Render the functions header or source for `feed`.
///
/// Nothing is written unless every declaration normalized and emitted.
pub fn run(
    config: &GbindConfig,
    feed: &Path,
    header: bool,
    output: Option<&Path>,
    skip_manifest: Option<&Path>,
) -> Result<()> {
    let decls = gbind_extract::load_feed(feed).with_context(|| format!("loading {}", feed.display()))?;
    let mapper = config.mapper();
    let unit = normalize_functions(&decls, &mapper, &config.normalize)?;

    let rendered = if header {
        functions_header(&unit.signatures, &config.output)?
    } else {
        functions_source(&unit.signatures, &config.output)?
    };

    if let Some(path) = skip_manifest {
        let manifest = unit.manifest.to_json_pretty().context("serializing skip manifest")?;
        write_output(Some(path), &manifest)?;
    }
    write_output(output, &rendered)
}
