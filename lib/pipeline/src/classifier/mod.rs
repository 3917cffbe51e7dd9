//! Text-understanding capability
//!
//! The router and the extractor never talk to a model directly; they go
//! through [`Classifier`]. Production wiring injects [`LlmClassifier`],
//! tests and offline runs use [`KeywordClassifier`].

pub mod keyword;
pub mod llm;
pub mod prompt;

pub use keyword::KeywordClassifier;
pub use llm::{LlmClassifier, LlmConfig};

use dealscout_core::{Strategy, ValueCatalog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassificationError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier timed out after {0}ms")]
    Timeout(u64),

    #[error("classifier returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("malformed classifier output: {0}")]
    Malformed(String),

    #[error("classifier output violates schema: {0}")]
    SchemaViolation(String),
}

/// Routing decision with the classifier's explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDecision {
    pub strategy: Strategy,
    pub rationale: String,
}

impl StrategyDecision {
    pub fn new(strategy: Strategy, rationale: impl Into<String>) -> Self {
        Self {
            strategy,
            rationale: rationale.into(),
        }
    }
}

/// One field of a raw extraction, before it is checked against the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DraftValue {
    Values(Vec<String>),
    /// A lone string where a list was expected
    Single(String),
    Range {
        #[serde(default)]
        gte: Option<f64>,
        #[serde(default)]
        lte: Option<f64>,
    },
}

/// Unvalidated field constraints as the classifier produced them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionDraft {
    pub fields: BTreeMap<String, DraftValue>,
}

impl ExtractionDraft {
    pub fn insert(&mut self, field: impl Into<String>, value: DraftValue) {
        self.fields.insert(field.into(), value);
    }
}

/// Structured-output text understanding.
///
/// Implementations must treat their upstream as unreliable: anything that
/// does not fit the declared output is returned as an error, never a panic.
pub trait Classifier: Send + Sync {
    fn classify(
        &self,
        text: &str,
        catalog: &ValueCatalog,
    ) -> Result<StrategyDecision, ClassificationError>;

    fn extract(&self, text: &str, catalog: &ValueCatalog) -> Result<ExtractionDraft, ClassificationError>;
}
