//! Hybrid retrieval
//!
//! Runs a compiled query against the store as one or two retrievers and
//! merges their rankings. A retriever that fails contributes an empty list;
//! the executor itself never fails.

use crate::config::FlexibleFusion;
use crate::fusion::{reciprocal_rank_fusion, RrfParams};
use dealscout_core::{
    effective_minimum_should_match, Clause, CompiledQuery, FusedResult, Predicate, RankedHit,
    SearchStore, StoreQuery,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure of a single retriever
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{retriever} retriever failed: {message}")]
pub struct RetrievalError {
    pub retriever: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutcome {
    pub result: FusedResult,
    /// Retrievers that ran
    pub retrievers: usize,
    pub failures: Vec<RetrievalError>,
}

impl ExecutionOutcome {
    /// Every retriever failed
    pub fn total_failure(&self) -> bool {
        self.retrievers > 0 && self.failures.len() == self.retrievers
    }
}

pub struct HybridExecutor {
    store: Arc<dyn SearchStore>,
    semantic_field: String,
    fusion: FlexibleFusion,
    rrf: RrfParams,
    final_k: usize,
}

impl HybridExecutor {
    pub fn new(store: Arc<dyn SearchStore>, semantic_field: impl Into<String>) -> Self {
        Self {
            store,
            semantic_field: semantic_field.into(),
            fusion: FlexibleFusion::default(),
            rrf: RrfParams::default(),
            final_k: 5,
        }
    }

    #[must_use]
    pub fn with_fusion(mut self, fusion: FlexibleFusion) -> Self {
        self.fusion = fusion;
        self
    }

    #[must_use]
    pub fn with_rrf(mut self, rrf: RrfParams) -> Self {
        self.rrf = rrf;
        self
    }

    #[must_use]
    pub fn with_final_k(mut self, final_k: usize) -> Self {
        self.final_k = final_k;
        self
    }

    fn semantic(&self, text: &str) -> Predicate {
        Predicate::Semantic {
            field: self.semantic_field.clone(),
            text: text.to_string(),
        }
    }

    fn candidates(&self) -> StoreQuery {
        StoreQuery::new(self.rrf.rank_window_size)
    }

    /// One retriever call; failure is logged and yields an empty list
    fn retrieve(&self, retriever: &'static str, query: &StoreQuery, outcome: &mut ExecutionOutcome) -> Vec<RankedHit> {
        outcome.retrievers += 1;
        match self.store.search(query) {
            Ok(docs) => {
                debug!(retriever, hits = docs.len(), "retrieved");
                let mut ranked = RankedHit::rank_all(docs);
                ranked.truncate(self.rrf.rank_window_size);
                ranked
            }
            Err(e) => {
                warn!(retriever, stage = "executing", error = %e, "retriever failed, continuing without it");
                outcome.failures.push(RetrievalError {
                    retriever,
                    message: e.to_string(),
                });
                Vec::new()
            }
        }
    }

    pub fn execute(&self, compiled: &CompiledQuery) -> ExecutionOutcome {
        let mut outcome = ExecutionOutcome::default();

        outcome.result = match compiled {
            CompiledQuery::SemanticOnly { semantic_text } => {
                let query = self.candidates().must(self.semantic(semantic_text));
                let list = self.retrieve("semantic", &query, &mut outcome);
                FusedResult::from_ranked(list, self.final_k)
            }
            CompiledQuery::Filtered { clauses, semantic_text } => {
                let mut query = with_clauses(self.candidates(), clauses, StoreQuery::filter);
                if let Some(text) = semantic_text {
                    query = query.should(self.semantic(text));
                }
                let list = self.retrieve("filtered", &query, &mut outcome);
                FusedResult::from_ranked(list, self.final_k)
            }
            CompiledQuery::Scored {
                semantic_text,
                should_clauses,
                minimum_should_match,
            } => {
                let msm = effective_minimum_should_match(*minimum_should_match, should_clauses.len());
                match self.fusion {
                    FlexibleFusion::Rrf => {
                        let semantic = self.candidates().must(self.semantic(semantic_text));
                        let structured = with_clauses(self.candidates(), should_clauses, StoreQuery::should)
                            .minimum_should_match(msm);
                        let lists = [
                            self.retrieve("semantic", &semantic, &mut outcome),
                            self.retrieve("structured", &structured, &mut outcome),
                        ];
                        reciprocal_rank_fusion(&lists, self.rrf, self.final_k)
                    }
                    FlexibleFusion::BoolShould => {
                        let query = with_clauses(self.candidates(), should_clauses, StoreQuery::should)
                            .must(self.semantic(semantic_text))
                            .minimum_should_match(msm);
                        let list = self.retrieve("scored", &query, &mut outcome);
                        FusedResult::from_ranked(list, self.final_k)
                    }
                }
            }
        };

        if outcome.total_failure() {
            warn!(shape = compiled.shape(), "all retrievers failed, returning no results");
        }
        outcome
    }
}

fn with_clauses(query: StoreQuery, clauses: &[Clause], add: fn(StoreQuery, Predicate) -> StoreQuery) -> StoreQuery {
    clauses
        .iter()
        .fold(query, |query, clause| add(query, Predicate::from(clause)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{store, FailingStore, MustFailingStore};
    use std::collections::BTreeSet;

    fn terms(field: &str, value: &str) -> Clause {
        Clause::Terms {
            field: field.to_string(),
            values: BTreeSet::from([value.to_string()]),
        }
    }

    fn executor(store: impl SearchStore + 'static) -> HybridExecutor {
        HybridExecutor::new(Arc::new(store), "description")
    }

    #[test]
    fn test_filtered_gates_membership() {
        let compiled = CompiledQuery::Filtered {
            clauses: vec![
                terms("industry", "fintech"),
                terms("location", "San Francisco"),
                Clause::Range {
                    field: "funding_amount".to_string(),
                    gte: Some(10.0e6),
                    lte: Some(15.0e6),
                },
            ],
            semantic_text: Some("payments".to_string()),
        };
        let outcome = executor(store()).execute(&compiled);
        assert_eq!(outcome.result.ids(), vec!["Ledgerly"]);
        assert_eq!(outcome.retrievers, 1);
    }

    #[test]
    fn test_filtered_orders_survivors_by_similarity() {
        let compiled = CompiledQuery::Filtered {
            clauses: vec![terms("industry", "fintech")],
            semantic_text: Some("wealth management".to_string()),
        };
        let outcome = executor(store()).execute(&compiled);
        assert_eq!(outcome.result.len(), 4);
        assert_eq!(outcome.result.ids()[0], "Vaultwise");
    }

    #[test]
    fn test_semantic_only() {
        let compiled = CompiledQuery::SemanticOnly {
            semantic_text: "radiology for hospitals".to_string(),
        };
        let outcome = executor(store()).execute(&compiled);
        assert_eq!(outcome.result.ids(), vec!["Mediscan"]);
    }

    #[test]
    fn test_scored_rrf_fuses_both_retrievers() {
        let compiled = CompiledQuery::Scored {
            semantic_text: "promising early-stage fintech".to_string(),
            should_clauses: vec![terms("industry", "fintech")],
            minimum_should_match: 2,
        };
        let outcome = executor(store()).execute(&compiled);

        assert_eq!(outcome.retrievers, 2);
        let ids = outcome.result.ids();
        assert_eq!(ids[0], "Seedly");
        assert_eq!(ids.len(), 4);
        let expected = 1.0 / 21.0 + 1.0 / 24.0;
        assert!((outcome.result.hits[0].score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_scored_bool_should_requires_semantic_match() {
        let compiled = CompiledQuery::Scored {
            semantic_text: "payments".to_string(),
            should_clauses: vec![terms("industry", "fintech"), terms("location", "New York")],
            minimum_should_match: 1,
        };
        let outcome = executor(store())
            .with_fusion(FlexibleFusion::BoolShould)
            .execute(&compiled);

        assert_eq!(outcome.retrievers, 1);
        let ids = outcome.result.ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"Ledgerly") && ids.contains(&"Coinbridge"));
    }

    #[test]
    fn test_final_k_truncates() {
        let compiled = CompiledQuery::SemanticOnly {
            semantic_text: String::new(),
        };
        let outcome = executor(store()).with_final_k(3).execute(&compiled);
        assert_eq!(outcome.result.len(), 3);
    }

    #[test]
    fn test_one_failed_retriever_keeps_the_other() {
        let compiled = CompiledQuery::Scored {
            semantic_text: "payments".to_string(),
            should_clauses: vec![terms("location", "Austin")],
            minimum_should_match: 2,
        };
        let outcome = executor(MustFailingStore(store())).execute(&compiled);

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].retriever, "semantic");
        assert!(!outcome.total_failure());
        assert_eq!(outcome.result.ids(), vec!["Cropsense", "Seedly"]);
    }

    #[test]
    fn test_total_failure_is_empty_result() {
        let compiled = CompiledQuery::Scored {
            semantic_text: "payments".to_string(),
            should_clauses: vec![terms("industry", "fintech")],
            minimum_should_match: 1,
        };
        let outcome = executor(FailingStore).execute(&compiled);
        assert!(outcome.total_failure());
        assert!(outcome.result.is_empty());
        assert_eq!(outcome.failures.len(), 2);
    }
}
