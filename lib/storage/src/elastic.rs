use crate::dsl::{catalog_body, parse_catalog, parse_hits, search_body, DslOptions};
use dealscout_core::{
    CatalogSource, DocumentSchema, Error, Result, ScoredDocument, SearchStore, StoreQuery,
    ValueCatalog,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Connection settings for an Elasticsearch index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElasticConfig {
    pub url: String,
    pub index: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default, flatten)]
    pub dsl: DslOptions,
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            index: "startups".to_string(),
            timeout_ms: default_timeout_ms(),
            dsl: DslOptions::default(),
        }
    }
}

/// Elasticsearch-backed search store and catalog source
pub struct ElasticStore {
    client: reqwest::blocking::Client,
    config: ElasticConfig,
}

impl ElasticStore {
    pub fn new(config: ElasticConfig) -> Result<Self> {
        if config.index.trim().is_empty() {
            return Err(Error::InvalidConfig("elasticsearch index name is empty".to_string()));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ElasticConfig {
        &self.config
    }

    fn search_url(&self) -> String {
        format!("{}/{}/_search", self.config.url.trim_end_matches('/'), self.config.index)
    }

    fn post(&self, body: &Value) -> Result<Value> {
        let url = self.search_url();
        let response = self.client.post(&url).json(body).send().map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.config.timeout_ms)
            } else if e.is_connect() {
                Error::Unavailable(self.config.url.clone())
            } else {
                Error::Store(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(Error::Store(format!("HTTP {}: {}", status.as_u16(), text)));
        }

        response
            .json::<Value>()
            .map_err(|e| Error::Store(format!("invalid response body: {}", e)))
    }
}

impl SearchStore for ElasticStore {
    fn search(&self, query: &StoreQuery) -> Result<Vec<ScoredDocument>> {
        let body = search_body(query, &self.config.dsl);
        debug!(index = %self.config.index, body = %body, "elasticsearch search");
        parse_hits(self.post(&body)?)
    }
}

impl CatalogSource for ElasticStore {
    fn fetch_catalog(&self, schema: &DocumentSchema, max_values: usize) -> Result<ValueCatalog> {
        let body = catalog_body(schema, max_values, &self.config.dsl);
        debug!(index = %self.config.index, "elasticsearch catalog aggregation");
        parse_catalog(&self.post(&body)?, schema)
    }
}
