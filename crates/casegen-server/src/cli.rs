//! Command-line interface

use anyhow::Context;
use casegen_core::{parse_blocks, reconcile_with_stats, SplitStyle, StoredTestCase, DEFAULT_SEPARATOR};
use casegen_service::ServiceConfig;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Generate and reconcile LLM test cases for GitHub repositories.
#[derive(Parser, Debug)]
#[command(
    name = "casegen",
    version,
    about,
    arg_required_else_help = true,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(ClapArgs, Debug, Default)]
pub struct GlobalOpts {
    /// Increase log verbosity (`-v` = debug, `-vv` = trace); RUST_LOG wins when set
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API and webhook receiver
    Serve(ServeArgs),

    /// Split an LLM reply into test-case blocks and print them as JSON
    Split(SplitArgs),

    /// Reconcile an annotated LLM reply against stored cases and print the entries
    Reconcile(ReconcileArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(long, short = 'c', env = "CASEGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the listen port
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(ClapArgs, Debug)]
pub struct SplitArgs {
    /// File holding the LLM reply
    pub file: PathBuf,

    /// Separator token between blocks
    #[arg(long, default_value = DEFAULT_SEPARATOR, conflicts_with = "numbered")]
    pub separator: String,

    /// Split on `1. `, `2. `, ... list markers instead of a separator
    #[arg(long)]
    pub numbered: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ReconcileArgs {
    /// File holding the annotated LLM reply
    pub response: PathBuf,

    /// JSON array of stored test cases
    pub existing: PathBuf,

    /// Separator token between blocks
    #[arg(long, default_value = DEFAULT_SEPARATOR)]
    pub separator: String,
}

/// Install the global tracing subscriber
///
/// # Errors
/// Returns error if a subscriber is already installed
pub fn init_tracing(verbose: u8, json: bool) -> anyhow::Result<()> {
    let default = match verbose {
        0 => "casegen=info",
        1 => "casegen=debug",
        _ => "casegen=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Blocks of a reply as pretty JSON
///
/// # Errors
/// Returns error if the file cannot be read or the separator is blank
pub fn run_split(args: &SplitArgs) -> anyhow::Result<String> {
    let reply = read(&args.file)?;
    let style = if args.numbered {
        SplitStyle::Numbered
    } else {
        SplitStyle::Delimited(args.separator.clone())
    };
    let blocks = style.split(&reply)?;
    tracing::debug!(blocks = blocks.len(), "split reply");
    Ok(serde_json::to_string_pretty(&blocks)?)
}

/// Reconciliation entries of a reply as pretty JSON
///
/// # Errors
/// Returns error if either file cannot be read or parsed
pub fn run_reconcile(args: &ReconcileArgs) -> anyhow::Result<String> {
    let reply = read(&args.response)?;
    let existing: Vec<StoredTestCase> = serde_json::from_str(&read(&args.existing)?)
        .with_context(|| format!("invalid stored cases in {}", args.existing.display()))?;

    let blocks = parse_blocks(&reply, &SplitStyle::Delimited(args.separator.clone()))?;
    let (entries, stats) = reconcile_with_stats(&blocks, &existing);
    tracing::info!(
        entries = entries.len(),
        unchanged = stats.unchanged,
        skipped = stats.skipped,
        unresolved = stats.unresolved,
        "reconciled reply"
    );
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Configuration for `serve`
///
/// # Errors
/// Returns error if the file or an environment override is invalid
pub fn serve_config(args: &ServeArgs) -> anyhow::Result<ServiceConfig> {
    let mut config = ServiceConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config = config.with_port(port);
    }
    Ok(config)
}
