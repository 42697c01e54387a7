//! ccstream CLI Library
//!
//! Replays captured Claude Code stream-json output through the incremental
//! parser and reports the reconstructed session.

pub mod input;
pub mod replay;
