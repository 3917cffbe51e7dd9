//! Structured constraints extracted from a free-text request

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Inclusive numeric bounds; a missing bound is unconstrained
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<f64>,
}

impl NumericRange {
    pub fn new(gte: Option<f64>, lte: Option<f64>) -> Self {
        Self { gte, lte }
    }

    pub fn between(gte: f64, lte: f64) -> Self {
        Self::new(Some(gte), Some(lte))
    }

    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.gte.is_none() && self.lte.is_none()
    }

    /// `gte > lte`; such a range can never match
    #[inline]
    pub fn is_inverted(&self) -> bool {
        matches!((self.gte, self.lte), (Some(lo), Some(hi)) if lo > hi)
    }

    pub fn contains(&self, value: f64) -> bool {
        self.gte.map_or(true, |lo| value >= lo) && self.lte.map_or(true, |hi| value <= hi)
    }
}

/// Constraint on a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldConstraint {
    /// Accepted values; any one of them satisfies the field
    Values(BTreeSet<String>),
    Range(NumericRange),
}

impl FieldConstraint {
    /// Empty value set or unbounded range
    pub fn is_default(&self) -> bool {
        match self {
            FieldConstraint::Values(values) => values.is_empty(),
            FieldConstraint::Range(range) => range.is_unbounded(),
        }
    }
}

/// Per-field constraints of one request.
///
/// Fields whose constraint is the default are left out. The only exception is
/// [`ConstraintSet::mark_unconstrained`], which records an explicit "no
/// constraint" as an empty value set; compilation ignores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintSet {
    fields: BTreeMap<String, FieldConstraint>,
}

impl ConstraintSet {
    /// The fully unconstrained set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a constraint; default constraints are dropped
    pub fn insert(&mut self, field: impl Into<String>, constraint: FieldConstraint) {
        let field = field.into();
        if constraint.is_default() {
            self.fields.remove(&field);
        } else {
            self.fields.insert(field, constraint);
        }
    }

    #[must_use]
    pub fn with_values<I, S>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.insert(field, FieldConstraint::Values(values));
        self
    }

    #[must_use]
    pub fn with_range(mut self, field: &str, gte: Option<f64>, lte: Option<f64>) -> Self {
        self.insert(field, FieldConstraint::Range(NumericRange::new(gte, lte)));
        self
    }

    /// Record that `field` was considered and deliberately left open
    pub fn mark_unconstrained(&mut self, field: impl Into<String>) {
        self.fields
            .insert(field.into(), FieldConstraint::Values(BTreeSet::new()));
    }

    #[inline]
    pub fn get(&self, field: &str) -> Option<&FieldConstraint> {
        self.fields.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldConstraint)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields carrying a real constraint
    pub fn populated(&self) -> usize {
        self.fields.values().filter(|c| !c.is_default()).count()
    }

    #[inline]
    pub fn is_unconstrained(&self) -> bool {
        self.populated() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constraints_are_omitted() {
        let set = ConstraintSet::new()
            .with_values("industry", Vec::<String>::new())
            .with_range("funding_amount", None, None);

        assert!(set.get("industry").is_none());
        assert!(set.get("funding_amount").is_none());
        assert!(set.is_unconstrained());
    }

    #[test]
    fn test_insert_default_clears_previous() {
        let mut set = ConstraintSet::new().with_values("industry", ["fintech"]);
        set.insert("industry", FieldConstraint::Values(BTreeSet::new()));
        assert!(set.get("industry").is_none());
    }

    #[test]
    fn test_mark_unconstrained_is_not_populated() {
        let mut set = ConstraintSet::new().with_values("location", ["Boston"]);
        set.mark_unconstrained("industry");

        assert!(set.get("industry").is_some());
        assert_eq!(set.populated(), 1);
    }

    #[test]
    fn test_range_helpers() {
        let range = NumericRange::between(10.0, 15.0);
        assert!(range.contains(10.0));
        assert!(range.contains(15.0));
        assert!(!range.contains(15.5));
        assert!(!range.is_inverted());
        assert!(NumericRange::between(5.0, 1.0).is_inverted());
        assert!(NumericRange::new(Some(1.0), None).contains(1e12));
    }

    #[test]
    fn test_serialized_shape() {
        let set = ConstraintSet::new()
            .with_values("industry", ["fintech"])
            .with_range("funding_amount", Some(1.0), None);
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "funding_amount": {"gte": 1.0},
                "industry": ["fintech"]
            })
        );
    }
}
