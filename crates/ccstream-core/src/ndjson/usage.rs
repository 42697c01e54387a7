//! Usage extraction from loosely-typed `usage` objects.
//!
//! Different producers spell the same counter differently (`input_tokens`,
//! `inputTokens`, `prompt_tokens`, ...). Each counter tries its spellings in
//! a fixed priority order and keeps the first strictly positive number.

use serde_json::{Map, Value};

use super::types::{TokenCount, Usage};

const INPUT_KEYS: &[&str] = &[
    "input_tokens",
    "inputTokens",
    "prompt_tokens",
    "promptTokens",
];
const OUTPUT_KEYS: &[&str] = &[
    "output_tokens",
    "outputTokens",
    "completion_tokens",
    "completionTokens",
];
const CACHE_READ_KEYS: &[&str] = &[
    "cache_read_input_tokens",
    "cacheReadInputTokens",
    "cache_read_tokens",
    "cacheReadTokens",
];
const CACHE_WRITE_KEYS: &[&str] = &[
    "cache_creation_input_tokens",
    "cacheCreationInputTokens",
    "cache_write_tokens",
    "cacheWriteTokens",
];
const TOTAL_KEYS: &[&str] = &["total_tokens", "totalTokens"];

/// Convert a `usage` value into a [`Usage`] record.
///
/// Returns `None` when the value is not an object or when no counter
/// resolves to a strictly positive number.
pub fn usage_from_value(val: &Value) -> Option<Usage> {
    let obj = val.as_object()?;
    let usage = Usage {
        input_tokens: first_positive(obj, INPUT_KEYS),
        output_tokens: first_positive(obj, OUTPUT_KEYS),
        cache_read_tokens: first_positive(obj, CACHE_READ_KEYS),
        cache_write_tokens: first_positive(obj, CACHE_WRITE_KEYS),
        total_tokens: first_positive(obj, TOTAL_KEYS),
    };
    usage.is_meaningful().then_some(usage)
}

fn first_positive(obj: &Map<String, Value>, keys: &[&str]) -> Option<TokenCount> {
    keys.iter()
        .filter_map(|key| obj.get(*key)?.as_f64())
        .find_map(TokenCount::new)
}
