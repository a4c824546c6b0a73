//! Decoding of the serialized result field.

use serde_json::Value;

use queryrun_core::ResultPayload;

use crate::error::DecodeError;

/// Maximum number of characters of raw input kept in a [`DecodeError`].
pub const PREVIEW_LEN: usize = 200;

/// Parse the raw result field of a finished query.
///
/// The read path may wrap the payload in one extra layer of quotes; it is
/// removed before parsing. The payload must be a JSON object.
pub fn decode(raw: &str) -> Result<ResultPayload, DecodeError> {
    let unwrapped = unwrap_quotes(raw.trim());
    let text = unwrapped.trim();
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => Ok(ResultPayload::new(fields)),
        Ok(other) => Err(DecodeError::Malformed {
            preview: preview(raw),
            reason: format!("expected a JSON object, found {}", type_name(&other)),
        }),
        Err(e) => Err(DecodeError::Malformed {
            preview: preview(raw),
            reason: e.to_string(),
        }),
    }
}

/// Remove one layer of surrounding quotes.
///
/// A double-quoted JSON string literal is unescaped rather than stripped so
/// that its escaped inner quotes survive.
fn unwrap_quotes(s: &str) -> std::borrow::Cow<'_, str> {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        if let Ok(inner) = serde_json::from_str::<String>(s) {
            return inner.into();
        }
    }

    let is_quote = |c: char| c == '\'' || c == '"';
    let s = s.strip_prefix(is_quote).unwrap_or(s);
    let s = s.strip_suffix(is_quote).unwrap_or(s);
    s.into()
}

/// Bounded, char-boundary safe excerpt of `raw`.
fn preview(raw: &str) -> String {
    let mut chars = raw.chars();
    let head: String = chars.by_ref().take(PREVIEW_LEN).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
