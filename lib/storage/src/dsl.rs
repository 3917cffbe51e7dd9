//! Elasticsearch query DSL translation
//!
//! Turns a [`StoreQuery`] into a `bool` query body and turns `_search`
//! responses (hits and aggregations) back into core types.

use dealscout_core::{
    Document, DocumentId, DocumentSchema, Error, FieldKind, FieldSummary, Predicate, Result,
    ScoredDocument, StoreQuery, ValueCatalog,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// How the semantic predicate is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticMode {
    /// `semantic` query over a `semantic_text` field
    #[default]
    Semantic,
    /// Plain full-text `match`, for indices without inference endpoints
    Match,
}

/// Field naming knobs for the target index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DslOptions {
    #[serde(default)]
    pub semantic_mode: SemanticMode,
    /// Suffix for exact-match sub-fields, e.g. `.keyword`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_suffix: Option<String>,
}

impl DslOptions {
    fn keyword_field(&self, field: &str) -> String {
        match &self.keyword_suffix {
            Some(suffix) => format!("{}{}", field, suffix),
            None => field.to_string(),
        }
    }
}

fn predicate_to_dsl(predicate: &Predicate, options: &DslOptions) -> Value {
    match predicate {
        Predicate::Terms { field, values } => {
            json!({ "terms": { options.keyword_field(field): values } })
        }
        Predicate::Range { field, gte, lte } => {
            let mut bounds = Map::new();
            if let Some(gte) = gte {
                bounds.insert("gte".to_string(), json!(gte));
            }
            if let Some(lte) = lte {
                bounds.insert("lte".to_string(), json!(lte));
            }
            json!({ "range": { field.as_str(): bounds } })
        }
        Predicate::Semantic { text, .. } if text.trim().is_empty() => json!({ "match_all": {} }),
        Predicate::Semantic { field, text } => match options.semantic_mode {
            SemanticMode::Semantic => json!({ "semantic": { "field": field, "query": text } }),
            SemanticMode::Match => json!({ "match": { field.as_str(): { "query": text } } }),
        },
    }
}

fn branch(predicates: &[Predicate], options: &DslOptions) -> Value {
    Value::Array(predicates.iter().map(|p| predicate_to_dsl(p, options)).collect())
}

/// Build the `_search` request body
pub fn search_body(query: &StoreQuery, options: &DslOptions) -> Value {
    if query.is_match_all() {
        return json!({ "size": query.size, "query": { "match_all": {} } });
    }

    let mut bool_query = Map::new();
    if !query.filter.is_empty() {
        bool_query.insert("filter".to_string(), branch(&query.filter, options));
    }
    if !query.must.is_empty() {
        bool_query.insert("must".to_string(), branch(&query.must, options));
    }
    if !query.should.is_empty() {
        bool_query.insert("should".to_string(), branch(&query.should, options));
        let required = query.required_should();
        if required > 0 {
            bool_query.insert("minimum_should_match".to_string(), json!(required));
        }
    }

    json!({ "size": query.size, "query": { "bool": bool_query } })
}

#[derive(Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Deserialize)]
struct HitsEnvelope {
    #[serde(default)]
    hits: Vec<RawHit>,
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source")]
    source: Value,
}

/// Parse hits in response order. A hit whose `_source` does not fit the
/// document schema fails the whole response.
pub fn parse_hits(body: Value) -> Result<Vec<ScoredDocument>> {
    let response: SearchResponse = serde_json::from_value(body)?;
    response
        .hits
        .hits
        .into_iter()
        .map(|hit| -> Result<ScoredDocument> {
            let document: Document = serde_json::from_value(hit.source)?;
            Ok(ScoredDocument {
                id: DocumentId::from(hit.id),
                document,
                score: hit.score.unwrap_or(0.0),
            })
        })
        .collect()
}

/// Aggregation request that yields the value catalog: `terms` per
/// categorical field, `stats` per numeric field
pub fn catalog_body(schema: &DocumentSchema, max_values: usize, options: &DslOptions) -> Value {
    let mut aggs = Map::new();
    for (field, kind) in schema.iter() {
        let agg = match kind {
            FieldKind::Categorical => {
                json!({ "terms": { "field": options.keyword_field(field), "size": max_values } })
            }
            FieldKind::Numeric => json!({ "stats": { "field": field } }),
            FieldKind::Text => continue,
        };
        aggs.insert(field.to_string(), agg);
    }
    json!({ "size": 0, "aggs": aggs })
}

/// Parse the aggregation response built from [`catalog_body`]
pub fn parse_catalog(body: &Value, schema: &DocumentSchema) -> Result<ValueCatalog> {
    let aggs = body
        .get("aggregations")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::Store("response carries no aggregations".to_string()))?;

    let mut fields = BTreeMap::new();
    for (field, kind) in schema.iter() {
        let Some(agg) = aggs.get(field) else { continue };
        match kind {
            FieldKind::Categorical => {
                let values: Vec<String> = agg
                    .get("buckets")
                    .and_then(Value::as_array)
                    .map(|buckets| {
                        buckets
                            .iter()
                            .filter_map(|b| match b.get("key") {
                                Some(Value::String(s)) => Some(s.clone()),
                                Some(Value::Number(n)) => Some(n.to_string()),
                                _ => None,
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                fields.insert(field.to_string(), FieldSummary::Categorical { values });
            }
            FieldKind::Numeric => {
                let stat = |name: &str| agg.get(name).and_then(Value::as_f64);
                // Stats over an empty corpus come back as nulls
                if let (Some(min), Some(max), Some(avg)) = (stat("min"), stat("max"), stat("avg")) {
                    fields.insert(field.to_string(), FieldSummary::Numeric { min, max, avg });
                }
            }
            FieldKind::Text => {}
        }
    }
    Ok(ValueCatalog::new(fields))
}
