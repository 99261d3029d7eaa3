//! badger-sync - Main entry point
//!
//! Classifies every product of every registered store catalog into a badge and
//! writes each catalog to its authoritative and mirror locations.
//!
//! **Usage:**
//! ```bash
//! badger-sync [run] [--root <dir>] [--config <file>] [--profile <name>]
//!             [--store <key>]... [--dry-run] [--export <file>] [--ascii]
//! badger-sync init-config <file> [--force]
//! ```
//!
//! **Exit codes:** 0 every catalog synced, 1 at least one catalog failed or is
//! partially synced, 2 configuration or startup error.

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use badger_common::config::{resolve_root_folder, write_toml_config, ConfigResolver, TomlConfig};
use badger_sync::{run_batch, OutputEncoding, Registry, ReportWriter, RuleSet, SyncOptions};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

const EXIT_INCOMPLETE: u8 = 1;
const EXIT_FATAL: u8 = 2;

/// Command-line arguments for badger-sync
#[derive(Parser, Debug)]
#[command(name = "badger-sync")]
#[command(about = "Assign catalog badges and sync store catalogs to their mirrors")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

impl Cli {
    /// Bare flags (no subcommand) mean `run`
    fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify and sync catalogs (default)
    Run(RunArgs),

    /// Write a config file containing the compiled defaults
    InitConfig {
        /// Destination path
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    /// Folder that relative catalog paths resolve against
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Config file (overrides BADGER_CONFIG and the user config)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Rule profile: standard or stock-aware
    #[arg(long, value_name = "NAME")]
    profile: Option<String>,

    /// Only sync this store (repeatable)
    #[arg(long = "store", value_name = "KEY")]
    stores: Vec<String>,

    /// Classify and report without writing any catalog
    #[arg(long)]
    dry_run: bool,

    /// Export the batch report as JSON
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Escape non-ASCII characters in the printed report
    #[arg(long)]
    ascii: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.into_command() {
        Command::Run(args) => run(args),
        Command::InitConfig { path, force } => {
            init_tracing("info");
            init_config(&path, force)
        }
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

/// Logs go to stderr so the report on stdout stays clean.
/// `RUST_LOG` wins over the configured level.
fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

/// Version, git hash, build time, profile and target captured by build.rs
fn build_info() -> String {
    format!(
        "badger-sync v{} [{}] built {} ({}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
        env!("BUILD_TARGET")
    )
}

fn run(args: RunArgs) -> Result<ExitCode> {
    let loaded = ConfigResolver::new(args.config.clone()).load();
    let level = loaded
        .as_ref()
        .map(|l| l.config.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&level);

    info!("Starting {}", build_info());

    let loaded = loaded.context("Failed to load configuration")?;
    if loaded.source.is_fallback() {
        warn!("No config file found, using compiled defaults");
    } else {
        info!("Configuration: {}", loaded.source);
    }

    let mut config = loaded.config;
    if let Some(profile) = &args.profile {
        config.rules.profile = profile.clone();
    }
    let rules = RuleSet::from_config(&config.rules).context("Invalid rule configuration")?;

    let root = resolve_root_folder(args.root.as_deref(), &config);
    info!("Root folder: {}", root.display());

    let registry = Registry::from_config(&config, &root)
        .and_then(|registry| registry.select(&args.stores))
        .context("Invalid store registry")?;

    let report = run_batch(&registry, &rules, &SyncOptions { dry_run: args.dry_run });

    let encoding = if args.ascii {
        OutputEncoding::AsciiEscaped
    } else {
        OutputEncoding::Utf8
    };
    let mut writer = ReportWriter::new(io::stdout().lock(), encoding);
    writer.write_report(&report).context("Failed to write report")?;

    let mut exported = true;
    if let Some(path) = &args.export {
        match report.export_json(path) {
            Ok(()) => info!("Report exported to {}", path.display()),
            Err(e) => {
                error!("Failed to export report to {}: {}", path.display(), e);
                exported = false;
            }
        }
    }

    if report.all_succeeded() && exported {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_INCOMPLETE))
    }
}

fn init_config(path: &Path, force: bool) -> Result<ExitCode> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    write_toml_config(&TomlConfig::default(), path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote default configuration to {}", path.display());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_bare_flags_default_to_run() {
        let cli = Cli::try_parse_from([
            "badger-sync",
            "--dry-run",
            "--store",
            "pretty",
            "--store",
            "nawaem",
            "--profile",
            "stock-aware",
        ])
        .unwrap();

        match cli.into_command() {
            Command::Run(args) => {
                assert!(args.dry_run);
                assert!(!args.ascii);
                assert_eq!(args.stores, vec!["pretty", "nawaem"]);
                assert_eq!(args.profile.as_deref(), Some("stock-aware"));
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_no_arguments_is_default_run() {
        let cli = Cli::try_parse_from(["badger-sync"]).unwrap();
        match cli.into_command() {
            Command::Run(args) => {
                assert!(args.stores.is_empty());
                assert!(args.config.is_none());
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_run_subcommand() {
        let cli = Cli::try_parse_from(["badger-sync", "run", "--ascii", "--export", "out.json"]).unwrap();
        match cli.into_command() {
            Command::Run(args) => {
                assert!(args.ascii);
                assert_eq!(args.export, Some(PathBuf::from("out.json")));
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn test_init_config_parses_path_and_force() {
        let cli = Cli::try_parse_from(["badger-sync", "init-config", "badger.toml", "--force"]).unwrap();
        match cli.into_command() {
            Command::InitConfig { path, force } => {
                assert_eq!(path, PathBuf::from("badger.toml"));
                assert!(force);
            }
            other => panic!("expected init-config, got {:?}", other),
        }
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "keep = true\n").unwrap();

        assert!(init_config(&path, false).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep = true\n");

        init_config(&path, true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("nawaem"));
    }

    #[test]
    fn test_build_info_names_version() {
        let info = build_info();
        assert!(info.contains(env!("CARGO_PKG_VERSION")));
        assert!(!env!("GIT_HASH").is_empty());
    }
}
