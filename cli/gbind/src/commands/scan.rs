//! `gbind scan`: options header text → options artifacts or definitions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use gbind_extract::{load_header, RawDeclaration, ScannerConfig};
use gbind_normalize::normalize_header;
use gbind_normalize::options::definitions_from_header;

use crate::commands::{options, write_output, OptionsMode};
use crate::config::GbindConfig;

pub fn run(config: &GbindConfig, headers: &[PathBuf], mode: OptionsMode, output: Option<&std::path::Path>) -> Result<()> {
    let scanner = ScannerConfig::default();
    let mut decls: Vec<RawDeclaration> = Vec::new();
    for header in headers {
        decls.extend(
            load_header(header, &scanner).with_context(|| format!("scanning {}", header.display()))?,
        );
    }

    let mut mapper = config.mapper();
    let rendered = if mode == OptionsMode::DumpDefs {
        let lowered = definitions_from_header(&decls, &mut mapper, &config.normalize)?;
        let json = gbind_extract::defs::to_json_pretty(&lowered.definitions)?;
        format!("{json}\n")
    } else {
        let unit = normalize_header(&decls, &mut mapper, &config.normalize)?;
        options::render(config, &unit, mode)?
    };
    write_output(output, &rendered)
}
