//! Query compilation
//!
//! One compiler serves both strategies. Clause construction is shared; the
//! strategy only decides whether the clauses become hard filters or soft
//! signals.

use dealscout_core::{
    effective_minimum_should_match, Clause, CompiledQuery, ConstraintSet, DocumentSchema,
    FieldConstraint, FieldKind, NumericRange, Strategy, ValueCatalog,
};
use thiserror::Error;
use tracing::warn;

/// A constraint that could not become a clause. Never fails the query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileIssue {
    #[error("range on {field} is inverted ({gte} > {lte})")]
    InvertedRange { field: String, gte: f64, lte: f64 },

    #[error("unknown field {0}")]
    UnknownField(String),

    #[error("field {field} is {actual}, cannot hold this constraint")]
    KindMismatch { field: String, actual: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    pub query: CompiledQuery,
    pub issues: Vec<CompileIssue>,
}

pub struct QueryCompiler {
    schema: DocumentSchema,
    minimum_should_match: usize,
}

impl QueryCompiler {
    pub fn new(schema: DocumentSchema, minimum_should_match: usize) -> Self {
        Self {
            schema,
            minimum_should_match,
        }
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    pub fn compile(
        &self,
        constraints: &ConstraintSet,
        text: &str,
        strategy: Strategy,
        catalog: &ValueCatalog,
    ) -> Compilation {
        let (clauses, issues) = self.clauses(constraints, catalog);
        for issue in &issues {
            warn!(query = text, stage = "compiling", issue = %issue, "clause dropped");
        }

        let semantic_text = text.trim().to_string();
        let query = if clauses.is_empty() {
            CompiledQuery::SemanticOnly { semantic_text }
        } else {
            match strategy {
                Strategy::Strict => CompiledQuery::Filtered {
                    clauses,
                    semantic_text: (!semantic_text.is_empty()).then_some(semantic_text),
                },
                Strategy::Flexible => {
                    let minimum_should_match =
                        effective_minimum_should_match(self.minimum_should_match, clauses.len());
                    CompiledQuery::Scored {
                        semantic_text,
                        should_clauses: clauses,
                        minimum_should_match,
                    }
                }
            }
        };

        Compilation { query, issues }
    }

    fn clauses(&self, constraints: &ConstraintSet, catalog: &ValueCatalog) -> (Vec<Clause>, Vec<CompileIssue>) {
        let mut clauses = Vec::new();
        let mut issues = Vec::new();

        for (field, constraint) in constraints.iter() {
            let Some(kind) = self.schema.kind(field) else {
                issues.push(CompileIssue::UnknownField(field.to_string()));
                continue;
            };

            match (constraint, kind) {
                // "No constraint"; an empty terms clause would exclude everything
                (FieldConstraint::Values(values), FieldKind::Categorical) if values.is_empty() => {}
                (FieldConstraint::Values(values), FieldKind::Categorical) => clauses.push(Clause::Terms {
                    field: field.to_string(),
                    values: values.clone(),
                }),
                (FieldConstraint::Range(range), FieldKind::Numeric) => {
                    if let (true, Some(gte), Some(lte)) = (range.is_inverted(), range.gte, range.lte) {
                        issues.push(CompileIssue::InvertedRange {
                            field: field.to_string(),
                            gte,
                            lte,
                        });
                        continue;
                    }
                    let range = trim_to_extent(*range, catalog.numeric_extent(field));
                    if !range.is_unbounded() {
                        clauses.push(Clause::Range {
                            field: field.to_string(),
                            gte: range.gte,
                            lte: range.lte,
                        });
                    }
                }
                (_, kind) => issues.push(CompileIssue::KindMismatch {
                    field: field.to_string(),
                    actual: kind.as_str(),
                }),
            }
        }

        (clauses, issues)
    }
}

/// Drop bounds that reach the corpus extent; they exclude nothing the
/// catalog knows of.
fn trim_to_extent(range: NumericRange, extent: Option<(f64, f64)>) -> NumericRange {
    let Some((min, max)) = extent else {
        return range;
    };
    NumericRange {
        gte: range.gte.filter(|&lo| lo > min),
        lte: range.lte.filter(|&hi| hi < max),
    }
}
