use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("semantic_field must not be empty")]
    EmptySemanticField,
}

/// How a scored query is retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlexibleFusion {
    /// Separate semantic and structured retrievers fused with RRF
    #[default]
    Rrf,
    /// One boolean retrieval: semantic `must`, clauses as `should`
    BoolShould,
}

/// Tuning knobs for the search pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Results returned to the caller
    pub final_k: usize,
    /// Positions per retriever eligible for fusion
    pub rank_window_size: usize,
    pub rank_constant: usize,
    /// Requested threshold for soft signals, relaxed to the number present
    pub minimum_should_match: usize,
    pub flexible_fusion: FlexibleFusion,
    /// Per-query deadline, checked between stages. A call already in flight
    /// may overrun it; `QueryPipeline::search_bounded` caps the wait.
    pub query_timeout_ms: u64,
    pub catalog_ttl_secs: u64,
    pub catalog_max_values: usize,
    pub semantic_field: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            final_k: 5,
            rank_window_size: 100,
            rank_constant: 20,
            minimum_should_match: 2,
            flexible_fusion: FlexibleFusion::Rrf,
            query_timeout_ms: 10_000,
            catalog_ttl_secs: 300,
            catalog_max_values: dealscout_core::DEFAULT_MAX_VALUES,
            semantic_field: "description".to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("final_k", self.final_k as u64),
            ("rank_window_size", self.rank_window_size as u64),
            ("query_timeout_ms", self.query_timeout_ms),
            ("catalog_max_values", self.catalog_max_values as u64),
        ];
        if let Some(&(field, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Zero { field });
        }
        if self.semantic_field.trim().is_empty() {
            return Err(ConfigError::EmptySemanticField);
        }
        Ok(())
    }

    #[inline]
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    #[inline]
    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_secs)
    }
}
