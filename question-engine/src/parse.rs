//! Response parser: raw model text → validated questions.
//!
//! The model is asked for a bare JSON array but often wraps it in fences or
//! prose. We take the first array whose elements look like question objects
//! and validate every element strictly. Model-supplied ids are ignored.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Deserializer, Map, Value};
use tracing::debug;

use crate::api_types::GeneratedQuestion;
use crate::error::ParseError;

/// Parse and validate raw model output.
///
/// An empty array is a valid (if useless) result; the reconciler treats it
/// as a count mismatch.
///
/// # Errors
/// - [`ParseError::MalformedJson`] when no candidate array parses
/// - [`ParseError::InvalidSchema`] when any element breaks the question shape
pub fn parse(raw: &str) -> Result<Vec<GeneratedQuestion>, ParseError> {
    let cleaned = sanitize_json_block(raw);
    let items = first_question_array(&cleaned).ok_or_else(|| {
        ParseError::MalformedJson(snippet(&cleaned))
    })?;

    let questions = items
        .iter()
        .enumerate()
        .map(|(i, v)| validate(i, v))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(questions = questions.len(), "model output parsed");
    Ok(questions)
}

/// Strip Markdown code fences and a BOM.
fn sanitize_json_block(s: &str) -> String {
    s.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .replace('\u{feff}', "")
        .trim()
        .to_string()
}

/// First `[` position where a complete JSON array starts that is empty or
/// begins with an object.
fn first_question_array(s: &str) -> Option<Vec<Value>> {
    for (pos, _) in s.match_indices('[') {
        let mut stream = Deserializer::from_str(&s[pos..]).into_iter::<Value>();
        if let Some(Ok(Value::Array(items))) = stream.next() {
            if items.first().is_none_or(Value::is_object) {
                return Some(items);
            }
        }
    }
    None
}

fn validate(index: usize, v: &Value) -> Result<GeneratedQuestion, ParseError> {
    let invalid = |reason: &str| ParseError::InvalidSchema {
        index,
        reason: reason.to_string(),
    };

    let obj = v.as_object().ok_or_else(|| invalid("not an object"))?;

    let text = required_str(obj, "text").ok_or_else(|| invalid("missing string field `text`"))?;
    let text = strip_source_numbering(text);
    if text.is_empty() {
        return Err(invalid("empty `text`"));
    }

    let options = obj
        .get("options")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("missing array field `options`"))?;
    if options.len() != 4 {
        return Err(invalid(&format!(
            "expected 4 options, got {}",
            options.len()
        )));
    }
    let mut opts: [String; 4] = Default::default();
    for (slot, o) in opts.iter_mut().zip(options) {
        let o = o
            .as_str()
            .ok_or_else(|| invalid("options must be strings"))?;
        *slot = o.trim().to_string();
    }

    let correct = obj
        .get("correctAnswer")
        .and_then(Value::as_u64)
        .filter(|&n| n <= 3)
        .ok_or_else(|| invalid("`correctAnswer` must be an integer in 0..=3"))?;

    let explanation = required_str(obj, "explanation")
        .ok_or_else(|| invalid("missing string field `explanation`"))?;

    Ok(GeneratedQuestion {
        id: String::new(),
        text,
        options: opts,
        correct_answer: correct as u8,
        explanation: explanation.trim().to_string(),
    })
}

fn required_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

/// Leading labels copied from source papers: `Q.44`, `Q1:`, `12.`, `(a)`.
fn numbering_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:(?i:q)(?:\.\s*\d+\s*[.:)\-]?|\s*\d+\s*[.:)\-])|\d{1,3}\s*[.)]|\([A-Za-z0-9]{1,3}\))\s+",
        )
        .ok()
    })
    .as_ref()
}

/// Removes up to a few stacked labels (`Q.44 (a) ...`). Never returns less than
/// the original when stripping would leave nothing.
fn strip_source_numbering(text: &str) -> String {
    let mut s = text.trim();
    if let Some(re) = numbering_re() {
        for _ in 0..3 {
            match re.find(s) {
                Some(m) if m.end() < s.len() => s = s[m.end()..].trim_start(),
                _ => break,
            }
        }
    }
    s.to_string()
}

fn snippet(s: &str) -> String {
    const MAX: usize = 200;
    if s.chars().count() <= MAX {
        s.to_string()
    } else {
        let cut: String = s.chars().take(MAX).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str) -> String {
        format!(
            r#"{{"id":"x","text":"{text}","options":["a","b","c","d"],"correctAnswer":2,"explanation":"because"}}"#
        )
    }

    #[test]
    fn accepts_fenced_array_with_prose() {
        let raw = format!(
            "Sure! Here are your questions:\n```json\n[{}, {}]\n```\nGood luck [1].",
            q("What is inertia?"),
            q("Define power.")
        );
        let out = parse(&raw).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "What is inertia?");
        assert_eq!(out[1].correct_answer, 2);
        assert!(out.iter().all(|q| q.id.is_empty()));
    }

    #[test]
    fn skips_non_question_arrays_before_the_payload() {
        let raw = format!("See [1] and [2, 3]. Result: [{}]", q("What is work?"));
        assert_eq!(parse(&raw).unwrap().len(), 1);
    }

    #[test]
    fn empty_array_parses() {
        assert!(parse("[]").unwrap().is_empty());
    }

    #[test]
    fn missing_array_is_malformed() {
        assert!(matches!(
            parse("I cannot help with that."),
            Err(ParseError::MalformedJson(_))
        ));
        assert!(matches!(
            parse(r#"[{"text": "unterminated"#),
            Err(ParseError::MalformedJson(_))
        ));
    }

    #[test]
    fn schema_violations_name_the_element() {
        let three = r#"[{"text":"t","options":["a","b","c"],"correctAnswer":0,"explanation":"e"}]"#;
        assert!(matches!(
            parse(three),
            Err(ParseError::InvalidSchema { index: 0, .. })
        ));

        let raw = format!(
            r#"[{}, {{"text":"t","options":["a","b","c","d"],"correctAnswer":4,"explanation":"e"}}]"#,
            q("ok")
        );
        assert!(matches!(
            parse(&raw),
            Err(ParseError::InvalidSchema { index: 1, .. })
        ));

        let no_expl = r#"[{"text":"t","options":["a","b","c","d"],"correctAnswer":1}]"#;
        assert!(matches!(parse(no_expl), Err(ParseError::InvalidSchema { .. })));

        let negative = r#"[{"text":"t","options":["a","b","c","d"],"correctAnswer":-1,"explanation":"e"}]"#;
        assert!(matches!(parse(negative), Err(ParseError::InvalidSchema { .. })));
    }

    #[test]
    fn strips_source_numbering() {
        assert_eq!(strip_source_numbering("Q.44 What is torque?"), "What is torque?");
        assert_eq!(strip_source_numbering("Q1: Define mass."), "Define mass.");
        assert_eq!(strip_source_numbering("12. Name the SI unit of force."), "Name the SI unit of force.");
        assert_eq!(strip_source_numbering("(a) Which gas is inert?"), "Which gas is inert?");
        assert_eq!(strip_source_numbering("Q.3 (b) Find x."), "Find x.");
        assert_eq!(strip_source_numbering("3.5 kg of water is heated."), "3.5 kg of water is heated.");
        assert_eq!(strip_source_numbering("Quantum numbers describe what?"), "Quantum numbers describe what?");
        assert_eq!(strip_source_numbering("q2) Find the current."), "Find the current.");
    }

    #[test]
    fn keeps_charge_symbols_that_open_a_question() {
        let pair = "Q1 and Q2 are point charges 3 m apart. What is the force?";
        assert_eq!(strip_source_numbering(pair), pair);
        let eq = "q1 = 2 C sits at the origin. Find the field at 1 m.";
        assert_eq!(strip_source_numbering(eq), eq);
        assert_eq!(
            strip_source_numbering("Q3. q1 = 2 C sits at the origin."),
            "q1 = 2 C sits at the origin."
        );
    }
}
