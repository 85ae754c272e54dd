//! JSON schemas for structured model output.
//!
//! Written to satisfy OpenAI strict mode: every property is listed in
//! `required`, optional values are nullable instead of omitted, and
//! `additionalProperties` is false. Ollama accepts the same documents.
//! Numeric bounds are stated in descriptions and enforced after parsing.

use scholarwatch_common::models::{MAX_KEY_POINTS, RELEVANCE_MAX, RELEVANCE_MIN};
use serde_json::{json, Value};

use crate::backend::ResponseFormat;

pub const ARTICLE_SUMMARY: &str = "article_summary";
pub const LITERATURE_REVIEW: &str = "literature_review";

pub fn article_summary_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "key_points": {
                "type": "array",
                "items": { "type": "string" },
                "description": format!("Between 1 and {MAX_KEY_POINTS} key findings of the article."),
            },
            "relevance_score": {
                "type": "integer",
                "description": format!(
                    "Relevance to the thesis subject, from {RELEVANCE_MIN} (unrelated) to {RELEVANCE_MAX} (central)."
                ),
            },
            "methodology": {
                "type": ["string", "null"],
                "description": "Research methodology, or null when the abstract does not say.",
            },
            "theoretical_framework": {
                "type": ["string", "null"],
                "description": "Theoretical framework, or null when none is identifiable.",
            },
        },
        "required": ["key_points", "relevance_score", "methodology", "theoretical_framework"],
        "additionalProperties": false,
    })
}

pub fn literature_review_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "review": {
                "type": "string",
                "description": "The literature review, in Markdown.",
            },
        },
        "required": ["review"],
        "additionalProperties": false,
    })
}

pub fn article_summary_format() -> ResponseFormat {
    ResponseFormat::JsonSchema {
        name: ARTICLE_SUMMARY.to_string(),
        schema: article_summary_schema(),
    }
}

pub fn literature_review_format() -> ResponseFormat {
    ResponseFormat::JsonSchema {
        name: LITERATURE_REVIEW.to_string(),
        schema: literature_review_schema(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Strict mode rejects schemas whose `required` list is not exhaustive.
    fn assert_strict(schema: &Value) {
        let props = schema["properties"].as_object().unwrap();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(props.len(), required.len());
        for key in props.keys() {
            assert!(required.contains(&key.as_str()), "{key} not required");
        }
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn test_schemas_are_strict() {
        assert_strict(&article_summary_schema());
        assert_strict(&literature_review_schema());
    }

    #[test]
    fn test_summary_schema_states_scale() {
        let schema = article_summary_schema();
        let desc = schema["properties"]["relevance_score"]["description"].as_str().unwrap();
        assert!(desc.contains("from 1") && desc.contains("to 20"), "{desc}");
    }
}
