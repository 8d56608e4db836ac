//! # docstage CLI
//!
//! Stages the Markdown documents of a source folder into a site's public folder.

use anyhow::{Context, Result};
use clap::Parser;
use docstage_core::{stage, Config, ModeSignals, RunMode, StageOptions, DEFAULT_CONFIG_FILE};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docstage")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Development run: link documents instead of copying them
    #[arg(long)]
    dev: bool,

    /// Link documents into the target instead of copying them
    #[arg(long)]
    symlink: bool,

    /// Path to configuration file (defaults to docstage.yml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Source directory containing the Markdown documents
    #[arg(long)]
    source: Option<PathBuf>,

    /// Target directory, wiped and rebuilt on every run
    #[arg(long)]
    target: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Development environment indicator; `development` behaves like `--dev`
const ENVIRONMENT_VAR: &str = "NODE_ENV";

impl Cli {
    /// `environment` is read once by the caller; a non-UTF-8 value counts as unset
    fn mode_signals(&self, environment: Option<OsString>) -> ModeSignals {
        ModeSignals {
            symlink_flag: self.symlink,
            dev_flag: self.dev,
            environment: environment.and_then(|value| value.into_string().ok()),
        }
    }

    fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path)),
            None => Config::from_file_or_default(DEFAULT_CONFIG_FILE)
                .context("Failed to load configuration"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.load_config()?;
    let options = StageOptions {
        source: cli.source.clone().unwrap_or_else(|| config.source_dir()),
        target: cli.target.clone().unwrap_or_else(|| config.target_dir()),
        mode: RunMode::resolve(&cli.mode_signals(std::env::var_os(ENVIRONMENT_VAR))),
    };

    tracing::debug!("Staging {:?} into {:?}", options.source, options.target);

    let report = stage(&options).context("Failed to stage documents")?;

    tracing::info!(
        "✓ Staged {} documents into {:?}",
        report.materialized.processed(),
        options.target
    );

    Ok(())
}
