//! Strategy routing
//!
//! Decides whether a request is read literally (hard filters) or loosely
//! (semantic ranking nudged by structured signals). Any classifier failure
//! falls back to the literal reading.

use crate::classifier::{ClassificationError, Classifier, StrategyDecision};
use dealscout_core::{Strategy, ValueCatalog};
use std::sync::Arc;
use tracing::{debug, warn};

/// Routing decision plus the failure that forced a fallback, if any
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingOutcome {
    pub decision: StrategyDecision,
    pub error: Option<ClassificationError>,
}

impl RoutingOutcome {
    #[inline]
    pub fn strategy(&self) -> Strategy {
        self.decision.strategy
    }

    #[inline]
    pub fn fell_back(&self) -> bool {
        self.error.is_some()
    }
}

pub struct StrategyRouter {
    classifier: Arc<dyn Classifier>,
}

impl StrategyRouter {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn decide(&self, text: &str, catalog: &ValueCatalog) -> RoutingOutcome {
        match self.classifier.classify(text, catalog) {
            Ok(decision) => {
                debug!(query = text, strategy = %decision.strategy, "routed");
                RoutingOutcome {
                    decision,
                    error: None,
                }
            }
            Err(error) => {
                warn!(query = text, stage = "routing", error = %error, "classification failed, falling back to strict");
                RoutingOutcome {
                    decision: StrategyDecision::new(
                        Strategy::Strict,
                        format!("fallback to strict: {}", error),
                    ),
                    error: Some(error),
                }
            }
        }
    }
}
