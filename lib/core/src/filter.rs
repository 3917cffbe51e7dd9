// Store-level query shape and structured predicate evaluation
use crate::document::Document;
use crate::query::Clause;
use serde::{Deserialize, Serialize};

pub trait Filter {
    fn matches(&self, doc: &Document) -> bool;
}

/// One predicate of a boolean store query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Predicate {
    Terms { field: String, values: Vec<String> },
    Range {
        field: String,
        gte: Option<f64>,
        lte: Option<f64>,
    },
    /// Similarity of `text` against a designated text field
    Semantic { field: String, text: String },
}

impl Predicate {
    #[inline]
    pub fn is_semantic(&self) -> bool {
        matches!(self, Predicate::Semantic { .. })
    }

    pub fn field(&self) -> &str {
        match self {
            Predicate::Terms { field, .. }
            | Predicate::Range { field, .. }
            | Predicate::Semantic { field, .. } => field,
        }
    }
}

impl From<&Clause> for Predicate {
    fn from(clause: &Clause) -> Self {
        match clause {
            Clause::Terms { field, values } => Predicate::Terms {
                field: field.clone(),
                values: values.iter().cloned().collect(),
            },
            Clause::Range { field, gte, lte } => Predicate::Range {
                field: field.clone(),
                gte: *gte,
                lte: *lte,
            },
        }
    }
}

/// Structured predicates are evaluated directly against the document.
/// Semantic predicates need an index and are never matched here.
impl Filter for Predicate {
    fn matches(&self, doc: &Document) -> bool {
        match self {
            Predicate::Terms { field, values } => doc
                .categorical_values(field)
                .map(|held| held.iter().any(|v| values.iter().any(|want| want == v)))
                .unwrap_or(false),
            Predicate::Range { field, gte, lte } => doc
                .numeric_value(field)
                .map(|v| gte.map_or(true, |lo| v >= lo) && lte.map_or(true, |hi| v <= hi))
                .unwrap_or(false),
            Predicate::Semantic { .. } => false,
        }
    }
}

/// Boolean composition sent to a store.
///
/// `filter` gates membership without scoring, `must` gates and scores,
/// `should` only scores unless `minimum_should_match` demands a number of
/// them. With neither `filter` nor `must`, at least one `should` has to
/// match. An empty query matches every document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<Predicate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Predicate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Predicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<usize>,
    pub size: usize,
}

impl StoreQuery {
    pub fn new(size: usize) -> Self {
        Self {
            filter: Vec::new(),
            must: Vec::new(),
            should: Vec::new(),
            minimum_should_match: None,
            size,
        }
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter.push(predicate);
        self
    }

    #[must_use]
    pub fn must(mut self, predicate: Predicate) -> Self {
        self.must.push(predicate);
        self
    }

    #[must_use]
    pub fn should(mut self, predicate: Predicate) -> Self {
        self.should.push(predicate);
        self
    }

    #[must_use]
    pub fn minimum_should_match(mut self, n: usize) -> Self {
        self.minimum_should_match = Some(n);
        self
    }

    #[inline]
    pub fn is_match_all(&self) -> bool {
        self.filter.is_empty() && self.must.is_empty() && self.should.is_empty()
    }

    /// Number of `should` predicates a document has to satisfy
    pub fn required_should(&self) -> usize {
        match self.minimum_should_match {
            Some(n) => n.min(self.should.len()),
            None if self.filter.is_empty() && self.must.is_empty() && !self.should.is_empty() => 1,
            None => 0,
        }
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.filter.iter().chain(self.must.iter()).chain(self.should.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::startup;

    fn doc() -> Document {
        let mut d = startup(
            "Ledgerly",
            "fintech",
            "San Francisco",
            "Series A",
            12_000_000.0,
            "Andreessen Horowitz",
            "payments",
        );
        d.other_investors = vec!["Accel".to_string()];
        d
    }

    #[test]
    fn test_terms_membership() {
        let p = Predicate::Terms {
            field: "industry".to_string(),
            values: vec!["healthtech".to_string(), "fintech".to_string()],
        };
        assert!(p.matches(&doc()));

        let multi = Predicate::Terms {
            field: "other_investors".to_string(),
            values: vec!["Accel".to_string()],
        };
        assert!(multi.matches(&doc()));

        let empty = Predicate::Terms { field: "industry".to_string(), values: vec![] };
        assert!(!empty.matches(&doc()));
    }

    #[test]
    fn test_terms_is_case_sensitive_like_keyword_fields() {
        let p = Predicate::Terms {
            field: "industry".to_string(),
            values: vec!["FinTech".to_string()],
        };
        assert!(!p.matches(&doc()));
    }

    #[test]
    fn test_range_bounds_inclusive() {
        let p = Predicate::Range {
            field: "funding_amount".to_string(),
            gte: Some(10_000_000.0),
            lte: Some(12_000_000.0),
        };
        assert!(p.matches(&doc()));

        let above = Predicate::Range {
            field: "funding_amount".to_string(),
            gte: Some(12_000_001.0),
            lte: None,
        };
        assert!(!above.matches(&doc()));
    }

    #[test]
    fn test_unknown_field_never_matches() {
        let p = Predicate::Range { field: "valuation".to_string(), gte: None, lte: None };
        assert!(!p.matches(&doc()));
    }

    #[test]
    fn test_required_should() {
        let should_only = StoreQuery::new(10).should(Predicate::Semantic {
            field: "description".to_string(),
            text: "x".to_string(),
        });
        assert_eq!(should_only.required_should(), 1);

        let with_must = should_only.clone().must(Predicate::Semantic {
            field: "description".to_string(),
            text: "y".to_string(),
        });
        assert_eq!(with_must.required_should(), 0);
        assert_eq!(with_must.clone().minimum_should_match(5).required_should(), 1);
        assert!(StoreQuery::new(1).is_match_all());
    }
}
