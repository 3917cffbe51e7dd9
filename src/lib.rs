//! # DealScout
//!
//! Hybrid structured + semantic search over startup funding records.
//!
//! A free-text request such as *"Series A fintech in San Francisco between
//! $10M and $15M"* is routed to a strict or flexible reading, turned into
//! catalog-checked constraints, compiled into a filtered, scored or
//! semantic-only query and executed against a search store, fusing multiple
//! retrievers with Reciprocal Rank Fusion.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! dealscout --documents startups.json serve --http-port 8080
//! curl -XPOST localhost:8080/search -d '{"query": "fintech in Austin"}' \
//!      -H 'content-type: application/json'
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use dealscout::prelude::*;
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
//! let outcome = pipeline.search("promising climate startups");
//! println!("{}", MarkdownRenderer.render("promising climate startups", &outcome));
//! ```
//!
//! ## Crate Structure
//!
//! - [`dealscout-core`](https://docs.rs/dealscout-core) - Documents, catalog, constraints, query shapes, in-memory store
//! - [`dealscout-storage`](https://docs.rs/dealscout-storage) - Elasticsearch store
//! - [`dealscout-pipeline`](https://docs.rs/dealscout-pipeline) - Routing, extraction, compilation, hybrid execution
//! - [`dealscout-api`](https://docs.rs/dealscout-api) - REST API

pub mod bootstrap;
pub mod config;

// Re-export core types
pub use dealscout_core::{
    Clause, CompiledQuery, ConstraintSet, Document, DocumentId, DocumentSchema, Error, FusedResult,
    MemoryStore, Result, SearchStore, Strategy, ValueCatalog,
};

// Re-export storage
pub use dealscout_storage::{ElasticConfig, ElasticStore};

// Re-export pipeline
pub use dealscout_pipeline::{
    Classifier, KeywordClassifier, LlmClassifier, MarkdownRenderer, PipelineConfig, QueryPipeline,
    ResultRenderer, SearchOutcome,
};

// Re-export API
pub use dealscout_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Classifier, Clause, CompiledQuery, ConstraintSet, Document, DocumentId, DocumentSchema,
        ElasticConfig, ElasticStore, Error, FusedResult, KeywordClassifier, LlmClassifier,
        MarkdownRenderer, MemoryStore, PipelineConfig, QueryPipeline, RestApi, Result,
        ResultRenderer, SearchOutcome, SearchStore, Strategy, ValueCatalog,
    };
}
