//! Change-set applier CLI.
//!
//! Reads an XML change-set payload (file or stdin) and writes every change
//! under a target root, then prints a per-change report. Individual changes
//! may be skipped or fail without failing the command; only a bad payload or
//! an unusable target root exits non-zero.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use applier::apply::{ApplyOptions, apply_payload};
use applier::core::report::render_report;
use applier::exit_codes;
use applier::io::config::{ApplierConfig, CONFIG_FILE, load_config, write_config};
use applier::io::payload::read_payload;
use applier::io::snapshot::collect_snapshot;
use applier::io::writer::WriteMode;
use applier::logging;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "applier",
    version,
    about = "Apply XML change sets to a directory tree"
)]
struct Cli {
    /// Config file (defaults to `applier.toml` in the working directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a change-set payload to the target root.
    Apply {
        /// Target root directory (overrides config `target_root`).
        #[arg(long)]
        root: Option<PathBuf>,
        /// Payload file; reads stdin when omitted or `-`.
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Report output format.
        #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
        format: ReportFormat,
        /// Allow paths that leave the target root (`..`, absolute paths).
        #[arg(long)]
        allow_path_escape: bool,
        /// Write through a temp file + rename.
        #[arg(long)]
        atomic: bool,
    },
    /// Print every file under the target root as one text document.
    Snapshot {
        /// Target root directory (overrides config `target_root`).
        #[arg(long)]
        root: Option<PathBuf>,
        /// Append an instruction section after the files.
        #[arg(long)]
        instruction: Option<String>,
    },
    /// Write a default config file.
    Init {
        /// Overwrite an existing config file.
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::FATAL);
    }
    std::process::exit(exit_codes::OK);
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let explicit_config = cli.config.is_some();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    match cli.command {
        Command::Apply {
            root,
            input,
            format,
            allow_path_escape,
            atomic,
        } => {
            let mut cfg = load_cli_config(&config_path, explicit_config)?;
            if let Some(root) = root {
                cfg.target_root = root;
            }
            cfg.allow_path_escape |= allow_path_escape;
            if atomic {
                cfg.write_mode = WriteMode::Atomic;
            }
            cmd_apply(&cfg, input.as_deref(), format)
        }
        Command::Snapshot { root, instruction } => {
            let cfg = load_cli_config(&config_path, explicit_config)?;
            let root = root.unwrap_or(cfg.target_root);
            cmd_snapshot(&root, instruction.as_deref())
        }
        Command::Init { force } => cmd_init(&config_path, force),
    }
}

/// Only the implicit `applier.toml` may be absent.
fn load_cli_config(path: &Path, explicit: bool) -> Result<ApplierConfig> {
    if explicit && !path.exists() {
        bail!("config file {} does not exist", path.display());
    }
    load_config(path)
}

fn cmd_apply(cfg: &ApplierConfig, input: Option<&Path>, format: ReportFormat) -> Result<()> {
    cfg.validate()?;
    let payload = read_payload(input)?;
    let options = ApplyOptions::from_config(cfg);
    debug!(
        root = %options.target_root.display(),
        write_mode = ?options.write_mode,
        "applying payload"
    );

    let report = apply_payload(&payload, &options)?;
    match format {
        ReportFormat::Text => print!("{}", render_report(&report)),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("serialize report")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn cmd_snapshot(root: &Path, instruction: Option<&str>) -> Result<()> {
    let snapshot = collect_snapshot(root)?;
    if snapshot.files.is_empty() {
        eprintln!("no files found under {}", root.display());
    }
    println!("{}", snapshot.render(instruction));
    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    write_config(path, &ApplierConfig::default())?;
    println!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_is_fatal_only_when_explicit() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("custom.toml");

        let cfg = load_cli_config(&path, false).expect("implicit default");
        assert_eq!(cfg, ApplierConfig::default());

        let err = load_cli_config(&path, true).expect_err("explicit missing");
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn parse_apply_defaults() {
        let cli = Cli::parse_from(["applier", "apply"]);
        assert!(matches!(
            cli.command,
            Command::Apply {
                root: None,
                input: None,
                format: ReportFormat::Text,
                allow_path_escape: false,
                atomic: false,
            }
        ));
    }

    #[test]
    fn parse_apply_with_flags() {
        let cli = Cli::parse_from([
            "applier",
            "--config",
            "custom.toml",
            "apply",
            "--root",
            "out",
            "--input",
            "-",
            "--format",
            "json",
            "--allow-path-escape",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
        match cli.command {
            Command::Apply {
                root,
                input,
                format,
                allow_path_escape,
                atomic,
            } => {
                assert_eq!(root, Some(PathBuf::from("out")));
                assert_eq!(input, Some(PathBuf::from("-")));
                assert_eq!(format, ReportFormat::Json);
                assert!(allow_path_escape);
                assert!(!atomic);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["applier", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
    }
}
