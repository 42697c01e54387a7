//! NDJSON line classifier for the Claude Code protocol.
//!
//! Implements tolerant reader pattern: the decoded line is treated as an
//! untrusted `Value` and every field is narrowed before use. Unknown types
//! and known types missing the fields that matter become [`Event::Unknown`].

use serde_json::Value;

use super::types::{Event, ResultEvent};
use super::usage::usage_from_value;
use crate::error::{Error, Result};

/// Parse a single NDJSON line from Claude's stdout.
pub fn parse_line(line: &str) -> Result<Event> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(Error::NdjsonParse("empty line".into()));
    }
    let raw: Value = serde_json::from_str(trimmed)?;
    parse_value(&raw)
}

/// Classify a decoded JSON value.
pub fn parse_value(raw: &Value) -> Result<Event> {
    if !raw.is_object() {
        return Err(Error::NdjsonParse("expected a JSON object".into()));
    }

    // Partial-message framing wraps the API event in a `stream_event`.
    let raw = match str_field(raw, "type") {
        Some("stream_event") => match raw.get("event") {
            Some(inner) if inner.is_object() => inner,
            _ => raw,
        },
        _ => raw,
    };

    let event_type = str_field(raw, "type").unwrap_or("");
    let event = match event_type {
        "content_block_delta" => parse_text_delta(raw),
        "content_block_start" => parse_tool_use_start(raw),
        "system" => Some(Event::SystemInit {
            session_id: session_id(raw),
        }),
        "result" => Some(Event::Result(parse_result(raw))),
        _ => None,
    };

    Ok(event.unwrap_or_else(|| Event::Unknown {
        event_type: event_type.to_string(),
    }))
}

fn parse_text_delta(raw: &Value) -> Option<Event> {
    let delta = raw.get("delta")?;
    if str_field(delta, "type")? != "text_delta" {
        return None;
    }
    let text = str_field(delta, "text")?;
    Some(Event::TextDelta(text.to_string()))
}

fn parse_tool_use_start(raw: &Value) -> Option<Event> {
    let block = raw.get("content_block")?;
    if str_field(block, "type")? != "tool_use" {
        return None;
    }
    let name = str_field(block, "name")?;
    Some(Event::ToolUseStart {
        name: name.to_string(),
    })
}

fn parse_result(raw: &Value) -> ResultEvent {
    ResultEvent {
        session_id: session_id(raw),
        usage: raw.get("usage").and_then(usage_from_value),
        result: str_field(raw, "result").map(String::from),
        is_error: raw.get("is_error").is_some_and(is_truthy),
    }
}

fn str_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key).and_then(Value::as_str)
}

/// Trimmed, non-empty `session_id`.
fn session_id(raw: &Value) -> Option<String> {
    str_field(raw, "session_id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
}

/// Loose truthiness, so `"is_error": 1` or `"is_error": "yes"` still count.
fn is_truthy(val: &Value) -> bool {
    match val {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndjson::{TokenCount, Usage};

    #[test]
    fn parse_text_delta_event() {
        let json = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hello"}}"#;
        assert_eq!(parse_line(json).unwrap(), Event::TextDelta("Hello".into()));
    }

    #[test]
    fn parse_wrapped_text_delta_event() {
        let json = r#"{"type":"stream_event","session_id":"s1","event":{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}}"#;
        assert_eq!(parse_line(json).unwrap(), Event::TextDelta("Hi".into()));
    }

    #[test]
    fn input_json_delta_is_unknown() {
        let json = r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"cmd\":"}}"#;
        assert_eq!(
            parse_line(json).unwrap(),
            Event::Unknown {
                event_type: "content_block_delta".into()
            }
        );
    }

    #[test]
    fn text_delta_without_string_payload_is_unknown() {
        let json = r#"{"type":"content_block_delta","delta":{"type":"text_delta","text":42}}"#;
        assert!(matches!(parse_line(json).unwrap(), Event::Unknown { .. }));
    }

    #[test]
    fn parse_tool_use_start_event() {
        let json = r#"{"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_1","name":"Bash","input":{}}}"#;
        assert_eq!(
            parse_line(json).unwrap(),
            Event::ToolUseStart {
                name: "Bash".into()
            }
        );
    }

    #[test]
    fn text_block_start_is_unknown() {
        let json = r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#;
        assert!(matches!(parse_line(json).unwrap(), Event::Unknown { .. }));
    }

    #[test]
    fn parse_system_init_trims_session_id() {
        let json = r#"{"type":"system","subtype":"init","session_id":"  abc-123 ","model":"m","tools":[]}"#;
        assert_eq!(
            parse_line(json).unwrap(),
            Event::SystemInit {
                session_id: Some("abc-123".into())
            }
        );
    }

    #[test]
    fn blank_or_non_string_session_id_is_none() {
        let blank = r#"{"type":"system","session_id":"   "}"#;
        let numeric = r#"{"type":"system","session_id":7}"#;
        for json in [blank, numeric] {
            assert_eq!(
                parse_line(json).unwrap(),
                Event::SystemInit { session_id: None }
            );
        }
    }

    #[test]
    fn parse_result_event() {
        let json = r#"{"type":"result","subtype":"success","is_error":false,"session_id":"abc-123","result":"Hello, world!","usage":{"input_tokens":50,"output_tokens":10}}"#;
        let Event::Result(result) = parse_line(json).unwrap() else {
            panic!("expected result event");
        };
        assert_eq!(result.session_id.as_deref(), Some("abc-123"));
        assert_eq!(result.result.as_deref(), Some("Hello, world!"));
        assert!(!result.is_error);
        assert_eq!(
            result.usage,
            Some(Usage {
                input_tokens: TokenCount::new(50.0),
                output_tokens: TokenCount::new(10.0),
                ..Usage::default()
            })
        );
    }

    #[test]
    fn result_with_zero_usage_has_no_usage() {
        let json = r#"{"type":"result","usage":{"input_tokens":0,"output_tokens":0}}"#;
        let Event::Result(result) = parse_line(json).unwrap() else {
            panic!("expected result event");
        };
        assert_eq!(result.usage, None);
        assert_eq!(result.result, None);
    }

    #[test]
    fn is_error_uses_truthiness() {
        let cases = [
            (r"true", true),
            (r"false", false),
            (r"1", true),
            (r"0", false),
            (r#""yes""#, true),
            (r#""""#, false),
            (r"null", false),
            (r"{}", true),
        ];
        for (flag, expected) in cases {
            let json = format!(r#"{{"type":"result","is_error":{flag},"result":"x"}}"#);
            let Event::Result(result) = parse_line(&json).unwrap() else {
                panic!("expected result event");
            };
            assert_eq!(result.is_error, expected, "is_error = {flag}");
        }
    }

    #[test]
    fn missing_or_non_string_type_is_unknown() {
        assert_eq!(
            parse_line(r#"{"delta":{"type":"text_delta","text":"x"}}"#).unwrap(),
            Event::Unknown {
                event_type: String::new()
            }
        );
        assert!(matches!(
            parse_line(r#"{"type":5}"#).unwrap(),
            Event::Unknown { .. }
        ));
    }

    #[test]
    fn unknown_type_is_unknown() {
        let json = r#"{"type":"future_type","data":"something"}"#;
        assert_eq!(
            parse_line(json).unwrap(),
            Event::Unknown {
                event_type: "future_type".into()
            }
        );
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(parse_line("").is_err());
        assert!(parse_line("   ").is_err());
        assert!(parse_line("not json").is_err());
        assert!(parse_line(r#"{"type":"result""#).is_err());
    }

    #[test]
    fn non_objects_are_errors() {
        for json in ["[1,2,3]", "\"result\"", "42", "null", "true"] {
            assert!(
                matches!(parse_line(json), Err(Error::NdjsonParse(_))),
                "{json} should be rejected"
            );
        }
    }
}
