//! # DealScout Core
//!
//! Core library for DealScout.
//!
//! This crate provides the data model shared by every stage of the search
//! pipeline and a reference store to run it against:
//!
//! - [`Document`] - A startup funding record with a store-assigned [`DocumentId`]
//! - [`DocumentSchema`] - Which fields are categorical, numeric or free text
//! - [`ValueCatalog`] - Snapshot of the values and ranges the corpus contains
//! - [`ConstraintSet`] - Structured constraints extracted from a request
//! - [`CompiledQuery`] - Filtered, scored or semantic-only query shapes
//! - [`StoreQuery`] - Boolean filter/must/should composition sent to a store
//! - [`MemoryStore`] - In-memory [`SearchStore`] with BM25 similarity
//!
//! ## Example
//!
//! ```rust
//! use dealscout_core::{DocumentSchema, MemoryStore, Predicate, SearchStore, StoreQuery};
//!
//! let store = MemoryStore::new(DocumentSchema::startups());
//! let query = StoreQuery::new(5)
//!     .filter(Predicate::Terms {
//!         field: "industry".to_string(),
//!         values: vec!["fintech".to_string()],
//!     })
//!     .should(Predicate::Semantic {
//!         field: "description".to_string(),
//!         text: "payments for marketplaces".to_string(),
//!     });
//! let results = store.search(&query).unwrap();
//! assert!(results.is_empty());
//! ```

pub mod bm25;
pub mod catalog;
pub mod constraint;
pub mod document;
pub mod error;
pub mod filter;
pub mod query;
pub mod result;
pub mod schema;
pub mod store;

pub use bm25::Bm25Index;
pub use catalog::{CatalogSource, FieldSummary, ValueCatalog, DEFAULT_MAX_VALUES};
pub use constraint::{ConstraintSet, FieldConstraint, NumericRange};
pub use document::{Document, DocumentId, StoredDocument};
pub use error::{Error, Result};
pub use filter::{Filter, Predicate, StoreQuery};
pub use query::{effective_minimum_should_match, Clause, CompiledQuery, Strategy};
pub use result::{FusedHit, FusedResult, RankedHit, ScoredDocument};
pub use schema::{DocumentSchema, FieldKind};
pub use store::{MemoryStore, SearchStore};
