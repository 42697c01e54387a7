//! Incremental session parser.
//!
//! [`StreamParser`] owns the whole pipeline: raw fragments go through the
//! [`LineBuffer`], each completed line is classified by [`parse_line`], and
//! the resulting [`Event`] updates the accumulated session state and fires
//! the matching observer.

use std::fmt;

use tracing::{debug, trace};

use super::line_buffer::LineBuffer;
use super::parser::parse_line;
use super::types::{Event, ResultEvent, SessionSummary, Usage};

type StrCallback<'a> = Box<dyn FnMut(&str) + Send + 'a>;
type UsageCallback<'a> = Box<dyn FnMut(&Usage) + Send + 'a>;

/// Optional callbacks invoked synchronously as events are recognized.
///
/// Every slot is independent; an unset slot is simply skipped.
#[derive(Default)]
pub struct Observers<'a> {
    on_text: Option<StrCallback<'a>>,
    on_tool_use: Option<StrCallback<'a>>,
    on_session_id: Option<StrCallback<'a>>,
    on_usage: Option<UsageCallback<'a>>,
    on_error: Option<StrCallback<'a>>,
}

impl<'a> Observers<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each streamed text fragment, including the one-off result fallback.
    #[must_use]
    pub fn on_text(mut self, f: impl FnMut(&str) + Send + 'a) -> Self {
        self.on_text = Some(Box::new(f));
        self
    }

    /// The name of each tool as its invocation starts.
    #[must_use]
    pub fn on_tool_use(mut self, f: impl FnMut(&str) + Send + 'a) -> Self {
        self.on_tool_use = Some(Box::new(f));
        self
    }

    /// The session identifier, once, when first established.
    #[must_use]
    pub fn on_session_id(mut self, f: impl FnMut(&str) + Send + 'a) -> Self {
        self.on_session_id = Some(Box::new(f));
        self
    }

    /// Each meaningful usage record carried by a result event.
    #[must_use]
    pub fn on_usage(mut self, f: impl FnMut(&Usage) + Send + 'a) -> Self {
        self.on_usage = Some(Box::new(f));
        self
    }

    /// The `result` message of a result event flagged as an error.
    #[must_use]
    pub fn on_error(mut self, f: impl FnMut(&str) + Send + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for Observers<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("on_text", &self.on_text.is_some())
            .field("on_tool_use", &self.on_tool_use.is_some())
            .field("on_session_id", &self.on_session_id.is_some())
            .field("on_usage", &self.on_usage.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Incremental parser for one session's stream-json output.
///
/// Feed it fragments as they arrive, call [`StreamParser::flush`] once at
/// end-of-stream, then read the accumulated state. Malformed or unknown lines
/// are logged and skipped; nothing here ever fails.
#[derive(Debug, Default)]
pub struct StreamParser<'a> {
    lines: LineBuffer,
    /// Append-only.
    chunks: Vec<String>,
    /// Write-once.
    session_id: Option<String>,
    /// Last-write-wins, never cleared.
    usage: Option<Usage>,
    observers: Observers<'a>,
}

impl<'a> StreamParser<'a> {
    /// Create a parser with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser that reports to the given observers.
    pub fn with_observers(observers: Observers<'a>) -> Self {
        Self {
            observers,
            ..Self::default()
        }
    }

    /// Feed a raw fragment; every line it completes is processed before
    /// this returns.
    pub fn feed(&mut self, fragment: &str) {
        for line in self.lines.push(fragment) {
            self.process_line(&line);
        }
    }

    /// Process the trailing unterminated line, if any.
    ///
    /// Call once at end-of-stream. Further calls are no-ops.
    pub fn flush(&mut self) {
        if let Some(line) = self.lines.take_remainder() {
            self.process_line(&line);
        }
    }

    /// Apply an already classified event.
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::TextDelta(text) => self.push_text(text),
            Event::ToolUseStart { name } => {
                if let Some(cb) = self.observers.on_tool_use.as_mut() {
                    cb(&name);
                }
            }
            Event::SystemInit {
                session_id: Some(id),
            } => self.set_session_id(id),
            Event::SystemInit { session_id: None } => {}
            Event::Result(result) => self.apply_result(result),
            Event::Unknown { event_type } => {
                trace!(event_type = %event_type, "Ignoring stream-json event");
            }
        }
    }

    /// All streamed text so far.
    pub fn text(&self) -> String {
        self.chunks.concat()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn usage(&self) -> Option<&Usage> {
        self.usage.as_ref()
    }

    /// Input received after the last newline.
    pub fn pending(&self) -> &str {
        self.lines.pending()
    }

    /// Owned snapshot of the accumulated state.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            text: self.text(),
            session_id: self.session_id.clone(),
            usage: self.usage,
        }
    }

    fn process_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match parse_line(line) {
            Ok(event) => self.apply(event),
            Err(e) => debug!(error = %e, "Discarding malformed stream-json line"),
        }
    }

    fn apply_result(&mut self, event: ResultEvent) {
        let ResultEvent {
            session_id,
            usage,
            result,
            is_error,
        } = event;

        if let Some(id) = session_id {
            self.set_session_id(id);
        }

        if let Some(usage) = usage {
            self.set_usage(usage);
        }

        // Fallback for producers that emit no incremental deltas.
        if self.chunks.is_empty()
            && let Some(text) = result.as_deref().filter(|t| !t.trim().is_empty())
        {
            self.push_text(text.to_string());
        }

        if !is_error {
            return;
        }
        if let Some(message) = result.as_deref() {
            debug!(error_message = message, "Stream reported an error result");
            if let Some(cb) = self.observers.on_error.as_mut() {
                cb(message);
            }
        }
    }

    fn push_text(&mut self, text: String) {
        if let Some(cb) = self.observers.on_text.as_mut() {
            cb(&text);
        }
        self.chunks.push(text);
    }

    /// Guarded set: the first identifier wins.
    fn set_session_id(&mut self, id: String) {
        if self.session_id.is_some() {
            trace!(ignored = %id, "Session id already established");
            return;
        }
        debug!(session_id = %id, "Session established");
        if let Some(cb) = self.observers.on_session_id.as_mut() {
            cb(&id);
        }
        self.session_id = Some(id);
    }

    /// Overwrites whatever was stored; records with no positive counter are
    /// ignored.
    fn set_usage(&mut self, usage: Usage) {
        if !usage.is_meaningful() {
            return;
        }
        if let Some(cb) = self.observers.on_usage.as_mut() {
            cb(&usage);
        }
        self.usage = Some(usage);
    }
}
