//! Incremental NDJSON parser for the Claude Code stream-json protocol.
//!
//! This module turns arbitrarily chunked stdout from Claude into a session
//! narrative (streamed text, tool invocations, session id, usage, errors),
//! implementing a tolerant reader pattern.

mod line_buffer;
mod parser;
mod stream;
mod types;
mod usage;

pub use line_buffer::LineBuffer;
pub use parser::{parse_line, parse_value};
pub use stream::{Observers, StreamParser};
pub use types::*;
pub use usage::usage_from_value;
