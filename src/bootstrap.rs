//! Wiring of stores and classifiers from configuration

use crate::config::{load_documents, AppConfig, ClassifierKind, SetupError, StoreBackend};
use dealscout_core::{CatalogSource, DocumentSchema, MemoryStore, SearchStore};
use dealscout_pipeline::{Classifier, KeywordClassifier, LlmClassifier, LlmConfig, QueryPipeline};
use dealscout_storage::{ElasticConfig, ElasticStore};
use std::sync::Arc;
use tracing::info;

/// Store handles: the search side and the catalog side of one backend
pub struct StoreHandles {
    pub search: Arc<dyn SearchStore>,
    pub catalog: Arc<dyn CatalogSource>,
}

/// Elasticsearch settings with the request timeout capped at the query deadline
pub fn elastic_config(config: &AppConfig) -> ElasticConfig {
    let mut elastic = config.store.elasticsearch.clone();
    elastic.timeout_ms = elastic.timeout_ms.min(config.pipeline.query_timeout_ms);
    elastic
}

/// LLM settings with the request timeout capped at the query deadline
pub fn llm_config(config: &AppConfig) -> LlmConfig {
    let mut llm = config.classifier.llm.clone();
    llm.timeout_ms = llm.timeout_ms.min(config.pipeline.query_timeout_ms);
    llm
}

pub fn build_store(config: &AppConfig, schema: &DocumentSchema) -> Result<StoreHandles, SetupError> {
    match config.store.backend {
        StoreBackend::Memory => {
            let store = Arc::new(MemoryStore::new(schema.clone()));
            if let Some(path) = &config.store.documents {
                let docs = load_documents(path)?;
                let ids = store.extend(docs);
                info!(documents = ids.len(), path = %path.display(), "memory store seeded");
            }
            Ok(StoreHandles {
                search: store.clone(),
                catalog: store,
            })
        }
        StoreBackend::Elasticsearch => {
            let store = Arc::new(ElasticStore::new(elastic_config(config))?);
            info!(
                url = %config.store.elasticsearch.url,
                index = %config.store.elasticsearch.index,
                "using elasticsearch store"
            );
            Ok(StoreHandles {
                search: store.clone(),
                catalog: store,
            })
        }
    }
}

pub fn build_classifier(config: &AppConfig) -> Result<Arc<dyn Classifier>, SetupError> {
    Ok(match config.classifier.kind {
        ClassifierKind::Keyword => Arc::new(KeywordClassifier::new()),
        ClassifierKind::Llm => {
            info!(model = %config.classifier.llm.model, "using LLM classifier");
            Arc::new(LlmClassifier::new(llm_config(config))?)
        }
    })
}

pub fn build_pipeline(config: &AppConfig) -> Result<QueryPipeline, SetupError> {
    let schema = DocumentSchema::startups().with_semantic_field(config.pipeline.semantic_field.clone());
    let stores = build_store(config, &schema)?;
    let classifier = build_classifier(config)?;
    Ok(QueryPipeline::new(
        classifier,
        stores.search,
        stores.catalog,
        schema,
        config.pipeline.clone(),
    )?)
}
