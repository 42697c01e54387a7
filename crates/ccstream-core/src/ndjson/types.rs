//! Event and usage types for the Claude Code NDJSON protocol.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// A classified stream-json event.
///
/// Only the events that feed the session narrative get their own variant;
/// everything else lands in [`Event::Unknown`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Incremental assistant text (`content_block_delta` / `text_delta`).
    TextDelta(String),
    /// A tool invocation started (`content_block_start` / `tool_use`).
    ToolUseStart { name: String },
    /// Session initialization (`system`).
    SystemInit { session_id: Option<String> },
    /// Terminal result of one exchange (`result`).
    Result(ResultEvent),
    /// Any other event, or a known one missing the fields that matter.
    Unknown { event_type: String },
}

/// Terminal result of one exchange.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultEvent {
    /// Trimmed, non-empty session identifier.
    pub session_id: Option<String>,
    /// Meaningful usage only; all-zero records are `None`.
    pub usage: Option<Usage>,
    /// Raw `result` string, untrimmed, possibly empty.
    pub result: Option<String>,
    pub is_error: bool,
}

/// A single token counter: any finite JSON number strictly above zero.
///
/// Whole values serialize back as integers, so `50` stays `50`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize)]
#[serde(try_from = "f64")]
pub struct TokenCount(f64);

impl TokenCount {
    /// `None` unless `value` is finite and positive.
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value > 0.0).then_some(Self(value))
    }

    pub const fn get(self) -> f64 {
        self.0
    }

    /// The count as an integer, when it is one that fits.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn as_u64(self) -> Option<u64> {
        // u64::MAX as f64 rounds up to 2^64, so the bound is exclusive.
        (self.0.fract() == 0.0 && self.0 < u64::MAX as f64).then_some(self.0 as u64)
    }
}

impl TryFrom<f64> for TokenCount {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("token count must be positive, got {value}"))
    }
}

impl Serialize for TokenCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_u64() {
            Some(n) => serializer.serialize_u64(n),
            None => serializer.serialize_f64(self.0),
        }
    }
}

impl fmt::Display for TokenCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_u64() {
            Some(n) => write!(f, "{n}"),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Token usage statistics.
///
/// Every counter is optional; a present counter is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<TokenCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<TokenCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<TokenCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write_tokens: Option<TokenCount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<TokenCount>,
}

impl Usage {
    /// Whether at least one counter is present.
    pub fn is_meaningful(&self) -> bool {
        [
            self.input_tokens,
            self.output_tokens,
            self.cache_read_tokens,
            self.cache_write_tokens,
            self.total_tokens,
        ]
        .iter()
        .any(Option::is_some)
    }
}

/// Owned snapshot of a session's accumulated state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionSummary {
    pub text: String,
    pub session_id: Option<String>,
    pub usage: Option<Usage>,
}
