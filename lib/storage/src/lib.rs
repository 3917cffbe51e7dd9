pub mod dsl;
pub mod elastic;

pub use dsl::{DslOptions, SemanticMode};
pub use elastic::{ElasticConfig, ElasticStore};
