//! Value catalog
//!
//! Snapshot of the values the corpus actually contains: distinct values per
//! categorical field and min/max/avg per numeric field. Extraction uses it to
//! reject values that do not exist, compilation uses it to recognise ranges
//! that span the whole corpus. A catalog is never edited after it is built;
//! refreshing means building a new one.

use crate::document::Document;
use crate::schema::{DocumentSchema, FieldKind};
use crate::Result;
use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default cap on distinct values kept per categorical field
pub const DEFAULT_MAX_VALUES: usize = 100;

/// Summary of one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldSummary {
    /// Distinct values, most frequent first
    Categorical { values: Vec<String> },
    Numeric { min: f64, max: f64, avg: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCatalog {
    pub fields: BTreeMap<String, FieldSummary>,
    pub built_at: DateTime<Utc>,
}

impl ValueCatalog {
    pub fn new(fields: BTreeMap<String, FieldSummary>) -> Self {
        Self {
            fields,
            built_at: Utc::now(),
        }
    }

    /// Catalog with no known values, used when no snapshot can be built
    pub fn empty() -> Self {
        Self::new(BTreeMap::new())
    }

    /// Aggregate a catalog from documents held in memory.
    ///
    /// Categorical values are ordered by descending frequency, ties broken
    /// alphabetically, and truncated to `max_values`. Numeric summaries only
    /// cover documents that carry the field.
    pub fn from_documents<'a, I>(docs: I, schema: &DocumentSchema, max_values: usize) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
    {
        let mut counts: BTreeMap<&str, AHashMap<String, usize>> = BTreeMap::new();
        let mut numbers: BTreeMap<&str, (f64, f64, f64, usize)> = BTreeMap::new();

        for doc in docs {
            for (field, kind) in schema.iter() {
                match kind {
                    FieldKind::Categorical => {
                        let Some(values) = doc.categorical_values(field) else {
                            continue;
                        };
                        let entry = counts.entry(field).or_default();
                        for value in values.into_iter().filter(|v| !v.trim().is_empty()) {
                            *entry.entry(value.to_string()).or_insert(0) += 1;
                        }
                    }
                    FieldKind::Numeric => {
                        let Some(value) = doc.numeric_value(field).filter(|v| v.is_finite()) else {
                            continue;
                        };
                        let entry = numbers
                            .entry(field)
                            .or_insert((f64::INFINITY, f64::NEG_INFINITY, 0.0, 0));
                        entry.0 = entry.0.min(value);
                        entry.1 = entry.1.max(value);
                        entry.2 += value;
                        entry.3 += 1;
                    }
                    FieldKind::Text => {}
                }
            }
        }

        let mut fields = BTreeMap::new();
        for (field, histogram) in counts {
            let mut ranked: Vec<(String, usize)> = histogram.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(max_values);
            let values = ranked.into_iter().map(|(value, _)| value).collect();
            fields.insert(field.to_string(), FieldSummary::Categorical { values });
        }
        for (field, (min, max, sum, n)) in numbers {
            fields.insert(
                field.to_string(),
                FieldSummary::Numeric {
                    min,
                    max,
                    avg: sum / n as f64,
                },
            );
        }

        Self::new(fields)
    }

    #[inline]
    pub fn get(&self, field: &str) -> Option<&FieldSummary> {
        self.fields.get(field)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Known values of a categorical field
    pub fn values(&self, field: &str) -> &[String] {
        match self.fields.get(field) {
            Some(FieldSummary::Categorical { values }) => values,
            _ => &[],
        }
    }

    /// Resolve `raw` to the catalog's spelling, ignoring case and
    /// surrounding whitespace. `None` means the value does not exist.
    pub fn canonical_value(&self, field: &str, raw: &str) -> Option<&str> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        self.values(field)
            .iter()
            .find(|known| known.eq_ignore_ascii_case(raw))
            .map(String::as_str)
    }

    /// Full `(min, max)` extent of a numeric field
    pub fn numeric_extent(&self, field: &str) -> Option<(f64, f64)> {
        match self.fields.get(field) {
            Some(FieldSummary::Numeric { min, max, .. }) => Some((*min, *max)),
            _ => None,
        }
    }

    /// JSON view handed to the classification capability as context
    pub fn to_context(&self) -> serde_json::Value {
        serde_json::to_value(&self.fields).unwrap_or(serde_json::Value::Null)
    }
}

/// Anything that can aggregate a fresh catalog from the corpus
pub trait CatalogSource: Send + Sync {
    fn fetch_catalog(&self, schema: &DocumentSchema, max_values: usize) -> Result<ValueCatalog>;
}
