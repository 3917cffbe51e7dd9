//! Prompts and response schemas for the LLM classifier

use dealscout_core::{FieldSummary, ValueCatalog};
use serde_json::{json, Map, Value};

pub const STRATEGY_SYSTEM: &str = "You route search requests over a database of startup funding records. \
Answer \"strict\" when the request names exact, binding criteria such as specific locations, \
funding stages, funding ranges or named investors. Answer \"flexible\" when the request is \
exploratory or conceptual and semantic similarity should dominate, with structured criteria \
only nudging the ranking. Give a one-sentence rationale.";

pub const EXTRACTION_SYSTEM: &str = "You extract search filters from a request over a database of \
startup funding records. Use only values listed in the catalog, spelled exactly as listed. \
For numeric fields return {\"gte\": number|null, \"lte\": number|null} in plain units \
(dollars, people, years). Leave out every field the request does not mention. \
Never guess a value that is not clearly requested.";

pub fn strategy_user_message(text: &str, catalog: &ValueCatalog) -> String {
    format!(
        "Catalog of available values:\n{}\n\nRequest:\n{}",
        catalog.to_context(),
        text
    )
}

pub fn extraction_user_message(text: &str, catalog: &ValueCatalog) -> String {
    format!(
        "Catalog of available values and numeric ranges:\n{}\n\nRequest:\n{}\n\n\
         Return a JSON object keyed by field name.",
        catalog.to_context(),
        text
    )
}

/// Output schema of the routing call
pub fn strategy_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "strategy": { "type": "string", "enum": ["strict", "flexible"] },
            "rationale": { "type": "string" }
        },
        "required": ["strategy", "rationale"],
        "additionalProperties": false
    })
}

/// Output schema of the extraction call. Categorical fields are restricted
/// to the catalog's values so a conforming model cannot invent one.
pub fn extraction_schema(catalog: &ValueCatalog) -> Value {
    let nullable_number = json!({ "type": ["number", "null"] });

    let mut properties = Map::new();
    for (field, summary) in &catalog.fields {
        let property = match summary {
            FieldSummary::Categorical { values } if values.is_empty() => {
                json!({ "type": "array", "items": { "type": "string" } })
            }
            FieldSummary::Categorical { values } => {
                json!({ "type": "array", "items": { "type": "string", "enum": values } })
            }
            FieldSummary::Numeric { .. } => json!({
                "type": "object",
                "properties": { "gte": nullable_number, "lte": nullable_number },
                "additionalProperties": false
            }),
        };
        properties.insert(field.clone(), property);
    }

    json!({
        "type": "object",
        "properties": properties,
        "additionalProperties": false
    })
}
