//! Structured advice extracted from free-form model output.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pipeline::value_to_attribute;

/// Suggestion used when the output carries no structured payload.
pub const FALLBACK_SUGGESTION: &str = "See raw output for details.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Advice {
    pub suggestions: Vec<String>,
    pub insights: Vec<String>,
    pub guidance: String,
}

impl Advice {
    /// Advice built from unparseable output: the raw text becomes the guidance.
    pub fn fallback(raw: &str) -> Self {
        Self {
            suggestions: vec![FALLBACK_SUGGESTION.to_string()],
            insights: Vec::new(),
            guidance: raw.to_string(),
        }
    }
}

/// Extracts [`Advice`] from model output.
///
/// The text from the first `{` to the end is parsed strictly as a JSON object. Missing
/// fields default to empty; non-string list items and guidance keep their JSON text.
/// Anything else (no `{`, invalid JSON, a non-object, or an empty object) yields
/// [`Advice::fallback`].
pub fn parse_advice(raw: &str) -> Advice {
    let Some(start) = raw.find('{') else {
        return Advice::fallback(raw);
    };

    let object = match serde_json::from_str::<Value>(&raw[start..]) {
        Ok(Value::Object(map)) if !map.is_empty() => map,
        _ => return Advice::fallback(raw),
    };

    Advice {
        suggestions: string_list(object.get("suggestions")),
        insights: string_list(object.get("insights")),
        guidance: object.get("guidance").map(value_to_attribute).unwrap_or_default(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().map(value_to_attribute).collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![value_to_attribute(other)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_object_after_preamble() {
        let raw = r#"Here you go: {"suggestions": ["add tests"], "insights": ["tight coupling"], "guidance": "start small"}"#;

        let advice = parse_advice(raw);
        assert_eq!(advice.suggestions, vec!["add tests"]);
        assert_eq!(advice.insights, vec!["tight coupling"]);
        assert_eq!(advice.guidance, "start small");
    }

    #[test]
    fn test_missing_fields_default_empty() {
        let advice = parse_advice(r#"{"guidance": "only this"}"#);
        assert!(advice.suggestions.is_empty());
        assert!(advice.insights.is_empty());
        assert_eq!(advice.guidance, "only this");
    }

    #[test]
    fn test_no_brace_falls_back() {
        let advice = parse_advice("plain prose answer");
        assert_eq!(advice, Advice::fallback("plain prose answer"));
        assert_eq!(advice.suggestions, vec![FALLBACK_SUGGESTION]);
    }

    #[test]
    fn test_trailing_text_falls_back() {
        let raw = "```json\n{\"guidance\": \"x\"}\n```";
        assert_eq!(parse_advice(raw), Advice::fallback(raw));
    }

    #[test]
    fn test_empty_object_falls_back() {
        assert_eq!(parse_advice("{}"), Advice::fallback("{}"));
    }

    #[test]
    fn test_non_string_items_kept_as_json_text() {
        let advice = parse_advice(r#"{"suggestions": [1, {"a": true}], "guidance": 3}"#);
        assert_eq!(advice.suggestions, vec!["1", r#"{"a":true}"#]);
        assert_eq!(advice.guidance, "3");
    }
}
