//! Document schema
//!
//! Declares which document fields can be constrained and how: categorical
//! fields compile to membership tests, numeric fields to ranges, and text
//! fields are only reachable through the semantic predicate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a field participates in filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Discrete values, matched by membership
    Categorical,
    /// Numbers, matched by inclusive range
    Numeric,
    /// Free text, matched by similarity only
    Text,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Categorical => "categorical",
            FieldKind::Numeric => "numeric",
            FieldKind::Text => "text",
        }
    }

    /// Text fields never produce structured clauses
    #[inline]
    pub fn is_filterable(&self) -> bool {
        !matches!(self, FieldKind::Text)
    }
}

/// Field layout of the document corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSchema {
    fields: BTreeMap<String, FieldKind>,
    /// Field the semantic-similarity predicate targets
    semantic_field: String,
}

impl DocumentSchema {
    pub fn new(fields: BTreeMap<String, FieldKind>, semantic_field: impl Into<String>) -> Self {
        Self {
            fields,
            semantic_field: semantic_field.into(),
        }
    }

    /// Schema of the startup funding corpus
    pub fn startups() -> Self {
        let fields = [
            ("company_name", FieldKind::Text),
            ("industry", FieldKind::Categorical),
            ("location", FieldKind::Categorical),
            ("funding_stage", FieldKind::Categorical),
            ("funding_amount", FieldKind::Numeric),
            ("lead_investor", FieldKind::Categorical),
            ("monthly_revenue", FieldKind::Numeric),
            ("employee_count", FieldKind::Numeric),
            ("business_model", FieldKind::Categorical),
            ("description", FieldKind::Text),
            ("founded_year", FieldKind::Numeric),
            ("other_investors", FieldKind::Categorical),
        ]
        .into_iter()
        .map(|(name, kind)| (name.to_string(), kind))
        .collect();

        Self::new(fields, "description")
    }

    /// Override the semantic field, keeping the field layout
    #[must_use]
    pub fn with_semantic_field(mut self, field: impl Into<String>) -> Self {
        self.semantic_field = field.into();
        self
    }

    #[inline]
    pub fn kind(&self, field: &str) -> Option<FieldKind> {
        self.fields.get(field).copied()
    }

    #[inline]
    pub fn semantic_field(&self) -> &str {
        &self.semantic_field
    }

    /// Filterable fields of the given kind, in name order
    pub fn fields_of(&self, kind: FieldKind) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}

impl Default for DocumentSchema {
    fn default() -> Self {
        Self::startups()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_schema_kinds() {
        let schema = DocumentSchema::startups();
        assert_eq!(schema.kind("industry"), Some(FieldKind::Categorical));
        assert_eq!(schema.kind("funding_amount"), Some(FieldKind::Numeric));
        assert_eq!(schema.kind("description"), Some(FieldKind::Text));
        assert_eq!(schema.kind("valuation"), None);
        assert_eq!(schema.semantic_field(), "description");
    }

    #[test]
    fn test_fields_of_is_sorted() {
        let schema = DocumentSchema::startups();
        let numeric: Vec<_> = schema.fields_of(FieldKind::Numeric).collect();
        assert_eq!(
            numeric,
            vec!["employee_count", "founded_year", "funding_amount", "monthly_revenue"]
        );
    }

    #[test]
    fn test_text_is_not_filterable() {
        assert!(!FieldKind::Text.is_filterable());
        assert!(FieldKind::Numeric.is_filterable());
    }
}
