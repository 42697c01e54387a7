//! Reassembles complete lines from arbitrarily split fragments.

/// Accumulates raw fragments and yields complete `\n`-terminated lines.
///
/// The trailing unterminated piece is held back until more input arrives or
/// [`LineBuffer::take_remainder`] is called. Nothing else about the content is
/// interpreted here; `\r` and blank lines pass through untouched.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment and return every line it completed, in order.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        if !fragment.contains('\n') {
            self.pending.push_str(fragment);
            return Vec::new();
        }

        self.pending.push_str(fragment);
        let mut lines: Vec<String> = self.pending.split('\n').map(String::from).collect();
        // split always yields at least one piece; the last one is unterminated.
        self.pending = lines.pop().unwrap_or_default();
        lines
    }

    /// Take the unterminated tail if it holds anything besides whitespace.
    ///
    /// The buffer is empty afterwards either way.
    pub fn take_remainder(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        (!rest.trim().is_empty()).then_some(rest)
    }

    /// The unterminated tail received so far.
    pub fn pending(&self) -> &str {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_without_newline_is_held() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(r#"{"type":"sys"#).is_empty());
        assert_eq!(buf.pending(), r#"{"type":"sys"#);
    }

    #[test]
    fn line_split_across_many_fragments() {
        let mut buf = LineBuffer::new();
        assert!(buf.push("{\"a\"").is_empty());
        assert!(buf.push(":").is_empty());
        assert_eq!(buf.push("1}\n{\"b\""), vec!["{\"a\":1}".to_string()]);
        assert_eq!(buf.pending(), "{\"b\"");
    }

    #[test]
    fn several_lines_in_one_fragment() {
        let mut buf = LineBuffer::new();
        let lines = buf.push("one\ntwo\n\nthree");
        assert_eq!(lines, vec!["one", "two", ""]);
        assert_eq!(buf.pending(), "three");
    }

    #[test]
    fn trailing_newline_leaves_empty_pending() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push("line\r\n"), vec!["line\r"]);
        assert_eq!(buf.pending(), "");
    }

    #[test]
    fn remainder_is_taken_once() {
        let mut buf = LineBuffer::new();
        buf.push("partial");
        assert_eq!(buf.take_remainder().as_deref(), Some("partial"));
        assert_eq!(buf.take_remainder(), None);
        assert_eq!(buf.pending(), "");
    }

    #[test]
    fn whitespace_remainder_is_dropped() {
        let mut buf = LineBuffer::new();
        buf.push("done\n  \t");
        assert_eq!(buf.take_remainder(), None);
        assert_eq!(buf.pending(), "");
    }
}
