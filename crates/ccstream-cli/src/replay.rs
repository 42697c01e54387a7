//! Replay mode.
//!
//! Feeds a captured stream-json transcript (file or stdin) through the
//! parser. In text mode assistant text streams to stdout as it is recognized;
//! in JSON mode a single report is printed once the stream ends.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use ccstream_core::config::OutputFormat;
use ccstream_core::{Observers, SessionSummary, StreamParser, Usage};
use serde::Serialize;
use tokio::io::AsyncRead;
use tracing::{info, warn};

use crate::input::feed_reader;

/// Replay mode configuration.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Transcript to read; `None` or `-` reads stdin.
    pub input: Option<PathBuf>,
    /// Bytes per read.
    pub chunk_size: usize,
    pub format: OutputFormat,
}

/// Everything learned from one replayed stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionReport {
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub tool_calls: Vec<String>,
    pub errors: Vec<String>,
    pub bytes_read: u64,
}

impl SessionReport {
    /// Whether the stream reported an upstream error.
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Tool calls and errors seen so far; shared with the observers.
#[derive(Debug, Default)]
struct Seen {
    tool_calls: Vec<String>,
    errors: Vec<String>,
}

/// Run replay mode.
pub async fn run(config: ReplayConfig) -> Result<SessionReport, ReplayError> {
    let report = match config.input.as_deref() {
        Some(path) if path.as_os_str() != "-" => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| ReplayError::Open {
                    path: path.to_path_buf(),
                    source,
                })?;
            replay(file, config.chunk_size, config.format).await?
        }
        _ => replay(tokio::io::stdin(), config.chunk_size, config.format).await?,
    };

    match config.format {
        OutputFormat::Text => print_text_footer(&report),
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(report)
}

/// Replay `reader` and collect a report, streaming to the terminal in text
/// mode.
pub async fn replay<R>(
    reader: R,
    chunk_size: usize,
    format: OutputFormat,
) -> Result<SessionReport, ReplayError>
where
    R: AsyncRead + Unpin,
{
    let seen = Arc::new(Mutex::new(Seen::default()));
    let streaming = format == OutputFormat::Text;

    let tools = Arc::clone(&seen);
    let errors = Arc::clone(&seen);
    let mut observers = Observers::new()
        .on_tool_use(move |name| {
            if streaming {
                print_tool(name);
            }
            lock(&tools).tool_calls.push(name.to_string());
        })
        .on_error(move |message| {
            warn!(error_message = message, "Stream reported an error");
            if streaming {
                print_error(message);
            }
            lock(&errors).errors.push(message.to_string());
        })
        .on_session_id(|id| info!(session_id = id, "Session started"));
    if streaming {
        observers = observers.on_text(print_text).on_usage(print_usage);
    }

    let mut parser = StreamParser::with_observers(observers);
    let bytes_read = feed_reader(reader, chunk_size, &mut parser).await?;
    let summary = parser.summary();
    drop(parser);

    let seen = std::mem::take(&mut *lock(&seen));
    info!(bytes_read, tool_calls = seen.tool_calls.len(), "Replay finished");
    Ok(SessionReport {
        summary,
        tool_calls: seen.tool_calls,
        errors: seen.errors,
        bytes_read,
    })
}

fn lock(seen: &Mutex<Seen>) -> std::sync::MutexGuard<'_, Seen> {
    // Observers never panic while holding the lock, so poisoning is benign.
    seen.lock().unwrap_or_else(PoisonError::into_inner)
}

#[allow(clippy::print_stdout)]
fn print_text(text: &str) {
    print!("{text}");
    let _ = std::io::stdout().flush();
}

#[allow(clippy::print_stderr)]
fn print_tool(name: &str) {
    eprintln!("[Tool: {name}]");
}

#[allow(clippy::print_stderr)]
fn print_error(message: &str) {
    eprintln!("[Error: {message}]");
}

#[allow(clippy::print_stderr)]
fn print_usage(usage: &Usage) {
    eprintln!("[Tokens: {}]", format_usage(usage));
}

#[allow(clippy::print_stdout, clippy::print_stderr)]
fn print_text_footer(report: &SessionReport) {
    // Final newline after streamed text output
    if !report.summary.text.is_empty() && !report.summary.text.ends_with('\n') {
        println!();
    }
    if let Some(id) = &report.summary.session_id {
        eprintln!("[Session: {id}]");
    }
}

#[allow(clippy::print_stdout)]
fn print_json(report: &SessionReport) -> Result<(), ReplayError> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}

/// Compact one-line rendering of the counters that are present.
pub fn format_usage(usage: &Usage) -> String {
    let parts: Vec<String> = [
        ("in", usage.input_tokens),
        ("out", usage.output_tokens),
        ("cache-read", usage.cache_read_tokens),
        ("cache-write", usage.cache_write_tokens),
        ("total", usage.total_tokens),
    ]
    .into_iter()
    .filter_map(|(label, count)| count.map(|n| format!("{n}{label}")))
    .collect();
    parts.join(" / ")
}

/// Replay mode errors.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read input: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}
