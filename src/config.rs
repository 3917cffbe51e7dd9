//! Application configuration
//!
//! Loaded from an optional TOML file; every section and key has a default,
//! so an empty file is a valid configuration.
//!
//! ```toml
//! [server]
//! http_port = 8080
//!
//! [store]
//! backend = "elasticsearch"
//!
//! [store.elasticsearch]
//! url = "http://localhost:9200"
//! index = "startups"
//! semantic_mode = "semantic"
//!
//! [classifier]
//! kind = "llm"
//!
//! [classifier.llm]
//! model = "gpt-4o-mini"
//!
//! [pipeline]
//! final_k = 5
//! flexible_fusion = "rrf"
//! ```

use dealscout_core::Document;
use dealscout_pipeline::{ClassificationError, ConfigError, LlmConfig, PipelineConfig};
use dealscout_storage::ElasticConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid documents file: {0}")]
    Documents(#[from] serde_json::Error),

    #[error("invalid pipeline config: {0}")]
    Pipeline(#[from] ConfigError),

    #[error("store setup failed: {0}")]
    Store(#[from] dealscout_core::Error),

    #[error("classifier setup failed: {0}")]
    Classifier(#[from] ClassificationError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { http_port: 8080 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Elasticsearch,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// JSON array of documents loaded into the memory store at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<PathBuf>,
    pub elasticsearch: ElasticConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Offline keyword rules
    #[default]
    Keyword,
    Llm,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub kind: ClassifierKind,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub classifier: ClassifierConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    /// Load from `path`, falling back to defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, SetupError> {
        let config = match path {
            Some(path) => {
                let contents = read(path)?;
                toml::from_str::<AppConfig>(&contents)?
            }
            None => AppConfig::default(),
        };
        config.pipeline.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn read(path: &Path) -> Result<String, SetupError> {
    fs::read_to_string(path).map_err(|source| SetupError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a JSON array of documents
pub fn load_documents(path: &Path) -> Result<Vec<Document>, SetupError> {
    let contents = read(path)?;
    Ok(serde_json::from_str(&contents)?)
}
