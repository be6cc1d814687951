//! Core data models used by the library.

use serde_json::Value;

/// A single retrieval hit with score, text and source.
///
/// `payload` keeps the full point payload so callers can read extra
/// metadata (`subject`, `page`, ...) without this crate knowing about it.
#[derive(Clone, Debug)]
pub struct RagHit {
    pub score: f32,
    pub text: String,
    pub source: Option<String>,
    pub payload: Value,
}

impl RagHit {
    /// Builds a hit from a raw payload, reading `text` and `source`.
    pub fn from_payload(score: f32, payload: Value) -> Self {
        let text = payload
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let source = payload
            .get("source")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self {
            score,
            text,
            source,
            payload,
        }
    }
}

/// Payload filter: a point matches if **any** `(field, value)` pair matches exactly.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RagFilter {
    pub any_of: Vec<(String, Value)>,
}

impl RagFilter {
    /// Any-of match of one keyword field against several values.
    pub fn field_in<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut any_of: Vec<(String, Value)> = Vec::new();
        for v in values {
            let v = Value::String(v.into());
            if !any_of.iter().any(|(_, seen)| seen == &v) {
                any_of.push((field.to_string(), v));
            }
        }
        Self { any_of }
    }

    /// Evaluates the filter against a JSON payload (used by in-memory indexes).
    pub fn matches(&self, payload: &Value) -> bool {
        self.any_of
            .iter()
            .any(|(field, want)| payload.get(field) == Some(want))
    }
}
