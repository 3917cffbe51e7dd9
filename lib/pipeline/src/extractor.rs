//! Constraint extraction
//!
//! The classifier proposes field values; only those that exist in the value
//! catalog survive, spelled the catalog's way. Failure of the classifier
//! yields the unconstrained set so retrieval degrades to semantic search
//! instead of returning nothing.

use crate::classifier::{ClassificationError, Classifier, DraftValue, ExtractionDraft};
use dealscout_core::{
    ConstraintSet, DocumentSchema, FieldConstraint, FieldKind, NumericRange, ValueCatalog,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Part of a draft that was discarded during validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DraftIssue {
    #[error("unknown field {0}")]
    UnknownField(String),

    #[error("field {0} is not filterable")]
    NotFilterable(String),

    #[error("field {field} expects a {expected} constraint")]
    KindMismatch { field: String, expected: &'static str },

    #[error("value {value:?} does not exist for {field}")]
    UnknownValue { field: String, value: String },

    #[error("non-finite bound for {0}")]
    NonFinite(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionOutcome {
    pub constraints: ConstraintSet,
    pub issues: Vec<DraftIssue>,
    pub error: Option<ClassificationError>,
}

pub struct FilterExtractor {
    classifier: Arc<dyn Classifier>,
    schema: DocumentSchema,
}

impl FilterExtractor {
    pub fn new(classifier: Arc<dyn Classifier>, schema: DocumentSchema) -> Self {
        Self { classifier, schema }
    }

    pub fn extract(&self, text: &str, catalog: &ValueCatalog) -> ExtractionOutcome {
        let draft = match self.classifier.extract(text, catalog) {
            Ok(draft) => draft,
            Err(error) => {
                warn!(query = text, stage = "extraction", error = %error, "extraction failed, continuing unconstrained");
                return ExtractionOutcome {
                    error: Some(error),
                    ..ExtractionOutcome::default()
                };
            }
        };

        let (constraints, issues) = validate_draft(&draft, catalog, &self.schema);
        for issue in &issues {
            debug!(query = text, issue = %issue, "draft value discarded");
        }
        ExtractionOutcome {
            constraints,
            issues,
            error: None,
        }
    }
}

/// Check a draft against the schema and the catalog.
///
/// Categorical values are kept only when the catalog knows them and are
/// rewritten to the catalog's spelling. An explicitly empty list is recorded
/// as "no constraint". Numeric bounds pass through unchanged, including
/// inverted ones, which compilation reports.
pub fn validate_draft(
    draft: &ExtractionDraft,
    catalog: &ValueCatalog,
    schema: &DocumentSchema,
) -> (ConstraintSet, Vec<DraftIssue>) {
    let mut constraints = ConstraintSet::new();
    let mut issues = Vec::new();

    for (field, value) in &draft.fields {
        let Some(kind) = schema.kind(field) else {
            issues.push(DraftIssue::UnknownField(field.clone()));
            continue;
        };

        match (kind, value) {
            (FieldKind::Categorical, DraftValue::Values(raw)) if raw.is_empty() => {
                constraints.mark_unconstrained(field.as_str());
            }
            (FieldKind::Categorical, DraftValue::Values(raw)) => {
                let values = canonical_values(field, raw.iter().map(String::as_str), catalog, &mut issues);
                constraints.insert(field.as_str(), FieldConstraint::Values(values));
            }
            (FieldKind::Categorical, DraftValue::Single(raw)) => {
                let values = canonical_values(field, std::iter::once(raw.as_str()), catalog, &mut issues);
                constraints.insert(field.as_str(), FieldConstraint::Values(values));
            }
            (FieldKind::Numeric, DraftValue::Range { gte, lte }) => {
                if gte.is_some_and(|v| !v.is_finite()) || lte.is_some_and(|v| !v.is_finite()) {
                    issues.push(DraftIssue::NonFinite(field.clone()));
                    continue;
                }
                constraints.insert(field.as_str(), FieldConstraint::Range(NumericRange::new(*gte, *lte)));
            }
            (FieldKind::Text, _) => issues.push(DraftIssue::NotFilterable(field.clone())),
            (FieldKind::Categorical, DraftValue::Range { .. }) => {
                issues.push(DraftIssue::KindMismatch {
                    field: field.clone(),
                    expected: "value list",
                });
            }
            (FieldKind::Numeric, _) => issues.push(DraftIssue::KindMismatch {
                field: field.clone(),
                expected: "range",
            }),
        }
    }

    (constraints, issues)
}

fn canonical_values<'a>(
    field: &str,
    raw: impl Iterator<Item = &'a str>,
    catalog: &ValueCatalog,
    issues: &mut Vec<DraftIssue>,
) -> BTreeSet<String> {
    let mut values = BTreeSet::new();
    for value in raw {
        match catalog.canonical_value(field, value) {
            Some(known) => {
                values.insert(known.to_string());
            }
            None => issues.push(DraftIssue::UnknownValue {
                field: field.to_string(),
                value: value.to_string(),
            }),
        }
    }
    values
}
