//! # DealScout API
//!
//! REST surface over the search pipeline (actix-web):
//!
//! - `POST /search` - run a query, JSON or Markdown report
//! - `POST /explain` - run a query and return every intermediate decision
//! - `GET /catalog` - current value catalog snapshot
//! - `POST /catalog/refresh` - rebuild the catalog now
//! - `GET /health`

pub mod rest;

pub use rest::RestApi;
