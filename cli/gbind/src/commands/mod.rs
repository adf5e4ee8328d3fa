//! CLI command implementations.

pub mod functions;
pub mod options;
pub mod scan;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

/// Which options artifact to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsMode {
    Header,
    Source,
    IntrospectableSource,
    /// Lowered definitions as JSON; header input only.
    DumpDefs,
}

/// Mutually exclusive artifact flags shared by `options` and `scan`.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct ModeArgs {
    /// Render the options header
    #[arg(long)]
    pub header: bool,
    /// Render the `struct_to_options` source
    #[arg(long)]
    pub source: bool,
    /// Render constructors, copies, destructors and boxed types
    #[arg(long)]
    pub introspectable_source: bool,
}

impl ModeArgs {
    pub fn mode(&self) -> OptionsMode {
        if self.header {
            OptionsMode::Header
        } else if self.source {
            OptionsMode::Source
        } else {
            OptionsMode::IntrospectableSource
        }
    }
}

/// Artifact flags of `scan`: the options artifacts plus `--dump-defs`.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct ScanModeArgs {
    /// Render the options header
    #[arg(long)]
    pub header: bool,
    /// Render enum converters and the `struct_to_options` source
    #[arg(long)]
    pub source: bool,
    /// Render constructors, copies, destructors and boxed types
    #[arg(long)]
    pub introspectable_source: bool,
    /// Write the lowered definitions as JSON
    #[arg(long)]
    pub dump_defs: bool,
}

impl ScanModeArgs {
    pub fn mode(&self) -> OptionsMode {
        if self.dump_defs {
            OptionsMode::DumpDefs
        } else {
            ModeArgs {
                header: self.header,
                source: self.source,
                introspectable_source: self.introspectable_source,
            }
            .mode()
        }
    }
}

/// Write `content` to `output`, or to stdout when absent.
///
/// Files are written next to the destination first and renamed into place,
/// so a failed run never leaves a truncated output behind.
pub fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    let Some(path) = output else {
        print!("{content}");
        return Ok(());
    };
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = std::path::PathBuf::from(staging);
    std::fs::write(&staging, content).with_context(|| format!("writing {}", staging.display()))?;
    std::fs::rename(&staging, path).with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = content.len(), "wrote output");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.h");
        std::fs::write(&path, "old").unwrap();
        write_output(Some(&path), "new\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
        assert!(!dir.path().join("out.h.tmp").exists());
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.h");
        assert!(write_output(Some(&path), "x").is_err());
    }
}
