//! Filter conversion to Qdrant `Filter`.
//!
//! Supports exact matching on scalar fields (`String`, `Number`, `Bool`);
//! all conditions go into `should`, giving any-of semantics.

use crate::record::RagFilter;
use qdrant_client::qdrant::{
    Condition, FieldCondition, Filter, Match, condition::ConditionOneOf, r#match::MatchValue,
};
use tracing::debug;

/// Converts [`RagFilter`] to Qdrant [`Filter`].
///
/// - `String` → `Keyword`
/// - integral `Number` → `Integer`
/// - `Bool`   → `Boolean`
///
/// Other value types are skipped.
pub fn to_qdrant_filter(f: &RagFilter) -> Filter {
    debug!(conditions = f.any_of.len(), "filters::to_qdrant_filter");

    let should = f
        .any_of
        .iter()
        .filter_map(|(field, val)| {
            let value = match val {
                serde_json::Value::String(s) => MatchValue::Keyword(s.clone()),
                serde_json::Value::Number(n) => MatchValue::Integer(n.as_i64()?),
                serde_json::Value::Bool(b) => MatchValue::Boolean(*b),
                _ => return None,
            };
            Some(Condition {
                condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                    key: field.clone(),
                    r#match: Some(Match {
                        match_value: Some(value),
                    }),
                    ..Default::default()
                })),
            })
        })
        .collect();

    Filter {
        should,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_of_becomes_should_conditions() {
        let f = RagFilter::field_in("subject", ["physics", "mixed"]);
        let q = to_qdrant_filter(&f);
        assert_eq!(q.should.len(), 2);
        assert!(q.must.is_empty());
    }

    #[test]
    fn unsupported_values_are_skipped() {
        let f = RagFilter {
            any_of: vec![
                ("page".into(), serde_json::json!(1.5)),
                ("tags".into(), serde_json::json!(["a"])),
                ("page".into(), serde_json::json!(3)),
            ],
        };
        assert_eq!(to_qdrant_filter(&f).should.len(), 1);
    }
}
