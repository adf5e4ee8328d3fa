//! gbind CLI: generates C-ABI GObject bindings for a native tensor API.

mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ModeArgs, ScanModeArgs};
use config::GbindConfig;

#[derive(Parser)]
#[command(name = "gbind", version, about = "GObject binding generator for native tensor APIs")]
struct Cli {
    /// Log at debug level unless GBIND_LOG or RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Configuration file (default: nearest gbind.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind the functions of a declarations feed
    Functions {
        /// Declarations feed (YAML)
        feed: PathBuf,
        /// Render the header instead of the source
        #[arg(long)]
        header: bool,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write skipped declarations as JSON
        #[arg(long)]
        skip_manifest: Option<PathBuf>,
    },
    /// Bind options structs from JSON definitions
    Options {
        /// Options definitions (JSON)
        defs: PathBuf,
        #[command(flatten)]
        mode: ModeArgs,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Bind options structs scanned from header text
    Scan {
        /// Options headers, scanned in order
        #[arg(required = true)]
        headers: Vec<PathBuf>,
        #[command(flatten)]
        mode: ScanModeArgs,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// Logs go to stderr so generated output can be piped from stdout.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("GBIND_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = GbindConfig::resolve(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Functions {
            feed,
            header,
            output,
            skip_manifest,
        } => commands::functions::run(
            &config,
            &feed,
            header,
            output.as_deref(),
            skip_manifest.as_deref(),
        ),

        Commands::Options { defs, mode, output } => {
            commands::options::run(&config, &defs, mode.mode(), output.as_deref())
        }

        Commands::Scan {
            headers,
            mode,
            output,
        } => commands::scan::run(&config, &headers, mode.mode(), output.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::OptionsMode;

    #[test]
    fn parses_functions() {
        let cli = Cli::try_parse_from([
            "gbind",
            "-v",
            "functions",
            "Declarations.yaml",
            "--header",
            "--output",
            "out.h",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Functions {
                feed,
                header,
                output,
                skip_manifest,
            } => {
                assert_eq!(feed, PathBuf::from("Declarations.yaml"));
                assert!(header);
                assert_eq!(output, Some(PathBuf::from("out.h")));
                assert!(skip_manifest.is_none());
            }
            _ => panic!("expected functions"),
        }
    }

    #[test]
    fn options_mode_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["gbind", "options", "defs.json"]).is_err());
        assert!(Cli::try_parse_from(["gbind", "options", "defs.json", "--header", "--source"]).is_err());
        assert!(Cli::try_parse_from(["gbind", "options", "defs.json", "--dump-defs"]).is_err());

        let cli = Cli::try_parse_from(["gbind", "options", "defs.json", "--introspectable-source"]).unwrap();
        match cli.command {
            Commands::Options { mode, .. } => assert_eq!(mode.mode(), OptionsMode::IntrospectableSource),
            _ => panic!("expected options"),
        }
    }

    #[test]
    fn scan_takes_several_headers() {
        let cli = Cli::try_parse_from(["gbind", "scan", "a.h", "b.h", "--dump-defs"]).unwrap();
        match cli.command {
            Commands::Scan { headers, mode, .. } => {
                assert_eq!(headers.len(), 2);
                assert_eq!(mode.mode(), OptionsMode::DumpDefs);
            }
            _ => panic!("expected scan"),
        }
        assert!(Cli::try_parse_from(["gbind", "scan", "--header"]).is_err());
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["gbind", "scan", "a.h", "--source", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }
}
