//! `ccstream` Core Library
//!
//! Shared functionality for `ccstream` components:
//! - Incremental NDJSON parsing for the Claude Code stream-json protocol
//! - Configuration resolution and hierarchy
//! - Tracing initialization
//! - Common error types

pub mod config;
pub mod error;
pub mod ndjson;
pub mod tracing_init;

pub use config::Config;
pub use error::{Error, Result};
pub use ndjson::{Observers, SessionSummary, StreamParser, TokenCount, Usage};
