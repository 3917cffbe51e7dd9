//! # DealScout Pipeline
//!
//! Turns a free-text request into a ranked result set:
//!
//! 1. [`StrategyRouter`] decides between a literal (strict) and an
//!    exploratory (flexible) reading
//! 2. [`FilterExtractor`] pulls catalog-checked field constraints out of the text
//! 3. [`QueryCompiler`] shapes them into a filtered, scored or semantic-only query
//! 4. [`HybridExecutor`] runs it against a store, fusing multiple retrievers
//!    with Reciprocal Rank Fusion
//!
//! [`QueryPipeline`] drives the four stages with a per-query deadline and
//! never returns an error: failures degrade the result and are reported on
//! the [`SearchOutcome`].
//!
//! ## Example
//!
//! ```rust
//! use dealscout_core::{DocumentSchema, MemoryStore};
//! use dealscout_pipeline::{KeywordClassifier, PipelineConfig, QueryPipeline};
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new(DocumentSchema::startups()));
//! let pipeline = QueryPipeline::new(
//!     Arc::new(KeywordClassifier::new()),
//!     store.clone(),
//!     store,
//!     DocumentSchema::startups(),
//!     PipelineConfig::default(),
//! )
//! .unwrap();
//!
//! let outcome = pipeline.search("seed stage climate startups");
//! assert!(outcome.result.is_empty());
//! ```

pub mod catalog_cache;
pub mod classifier;
pub mod compiler;
pub mod config;
pub mod executor;
pub mod extractor;
pub mod fusion;
pub mod pipeline;
pub mod render;
pub mod router;

#[cfg(test)]
mod testing;

pub use catalog_cache::CatalogCache;
pub use classifier::{
    ClassificationError, Classifier, DraftValue, ExtractionDraft, KeywordClassifier, LlmClassifier,
    LlmConfig, StrategyDecision,
};
pub use compiler::{Compilation, CompileIssue, QueryCompiler};
pub use config::{ConfigError, FlexibleFusion, PipelineConfig};
pub use executor::{ExecutionOutcome, HybridExecutor, RetrievalError};
pub use extractor::{validate_draft, DraftIssue, ExtractionOutcome, FilterExtractor};
pub use fusion::{reciprocal_rank_fusion, RrfParams};
pub use pipeline::{QueryPipeline, SearchOutcome, Stage, StageFailure};
pub use render::{MarkdownRenderer, ResultRenderer};
pub use router::{RoutingOutcome, StrategyRouter};
