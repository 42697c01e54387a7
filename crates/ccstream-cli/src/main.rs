//! ccstream CLI
//!
//! Replays Claude Code stream-json output (a file or stdin) through the
//! incremental parser and reports the reconstructed session.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use ccstream_cli::replay::{self, ReplayConfig};
use ccstream_core::config::{OutputFormat, load_config};
use ccstream_core::tracing_init::{default_filter, init_tracing};

#[derive(Parser, Debug)]
#[command(name = "ccstream")]
#[command(version, about = "Replay Claude Code stream-json output", long_about = None)]
struct Cli {
    /// Transcript to read (stdin when omitted or "-")
    input: Option<PathBuf>,

    /// Bytes per read; small values exercise arbitrary fragment boundaries
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Output format ("text" or "json")
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Log level for ccstream crates (overrides config)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit structured JSON logs on stderr
    #[arg(long)]
    log_json: bool,

    /// Directory searched for `.ccstream/settings.json`
    #[arg(long)]
    project_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let project_dir = match cli.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    let mut config = load_config(Some(project_dir.as_path()))?;
    if let Some(chunk_size) = cli.chunk_size {
        config.cli.chunk_size = chunk_size;
    }
    if let Some(format) = cli.format {
        config.cli.format = format;
    }
    if let Some(log_level) = cli.log_level {
        config.cli.log_level = log_level;
    }
    config.validate()?;

    init_tracing(&default_filter(&config.cli.log_level), cli.log_json)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        chunk_size = config.cli.chunk_size,
        format = %config.cli.format,
        "Starting ccstream"
    );

    let report = replay::run(ReplayConfig {
        input: cli.input,
        chunk_size: config.cli.chunk_size,
        format: config.cli.format,
    })
    .await?;

    Ok(if report.failed() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
