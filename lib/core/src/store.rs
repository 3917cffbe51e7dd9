use crate::bm25::Bm25Index;
use crate::catalog::{CatalogSource, ValueCatalog};
use crate::document::{Document, DocumentId, StoredDocument};
use crate::filter::{Filter, Predicate, StoreQuery};
use crate::result::ScoredDocument;
use crate::schema::{DocumentSchema, FieldKind};
use crate::{Error, Result};
use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::debug;

/// Anything that can answer a boolean store query with a ranked list
pub trait SearchStore: Send + Sync {
    fn search(&self, query: &StoreQuery) -> Result<Vec<ScoredDocument>>;
}

/// Score a matched structured predicate contributes, as a constant-score
/// term query would
const STRUCTURED_MATCH_SCORE: f32 = 1.0;

/// In-memory document store.
///
/// Filters are evaluated against each document, similarity is BM25 over the
/// schema's semantic field. Results are ordered by score, ties keep
/// insertion order.
pub struct MemoryStore {
    schema: DocumentSchema,
    docs: RwLock<AHashMap<DocumentId, Document>>,
    order: RwLock<Vec<DocumentId>>,
    index: RwLock<Bm25Index>,
}

impl MemoryStore {
    pub fn new(schema: DocumentSchema) -> Self {
        Self {
            schema,
            docs: RwLock::new(AHashMap::new()),
            order: RwLock::new(Vec::new()),
            index: RwLock::new(Bm25Index::new()),
        }
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    pub fn count(&self) -> usize {
        self.docs.read().len()
    }

    /// Store a document under a freshly assigned id
    pub fn insert(&self, doc: Document) -> DocumentId {
        let id = DocumentId::generate();
        self.upsert(id.clone(), doc);
        id
    }

    /// Store a document under a caller-chosen id, replacing any previous one
    pub fn upsert(&self, id: DocumentId, doc: Document) {
        let text = doc.text_value(self.schema.semantic_field()).unwrap_or_default().to_string();
        self.index.write().insert(&id, &text);

        let mut docs = self.docs.write();
        if docs.insert(id.clone(), doc).is_none() {
            self.order.write().push(id);
        }
    }

    pub fn extend<I: IntoIterator<Item = Document>>(&self, docs: I) -> Vec<DocumentId> {
        docs.into_iter().map(|doc| self.insert(doc)).collect()
    }

    pub fn get(&self, id: &DocumentId) -> Option<Document> {
        self.docs.read().get(id).cloned()
    }

    pub fn delete(&self, id: &DocumentId) -> Result<()> {
        if self.docs.write().remove(id).is_none() {
            return Err(Error::DocumentNotFound(id.to_string()));
        }
        self.order.write().retain(|known| known != id);
        self.index.write().remove(id);
        Ok(())
    }

    /// Snapshot of every stored document in insertion order
    pub fn documents(&self) -> Vec<StoredDocument> {
        let docs = self.docs.read();
        self.order
            .read()
            .iter()
            .filter_map(|id| {
                docs.get(id).map(|doc| StoredDocument {
                    id: id.clone(),
                    document: doc.clone(),
                })
            })
            .collect()
    }

    fn validate(&self, query: &StoreQuery) -> Result<()> {
        for predicate in query.predicates() {
            let field = predicate.field();
            let kind = self
                .schema
                .kind(field)
                .ok_or_else(|| Error::UnknownField(field.to_string()))?;
            let expected = match predicate {
                Predicate::Terms { .. } => FieldKind::Categorical,
                Predicate::Range { .. } => FieldKind::Numeric,
                Predicate::Semantic { .. } => FieldKind::Text,
            };
            if kind != expected {
                return Err(Error::FieldKindMismatch {
                    field: field.to_string(),
                    expected: expected.as_str(),
                    actual: kind.as_str(),
                });
            }
        }
        Ok(())
    }
}

/// Per-query semantic scores, one map per distinct semantic predicate text
struct SemanticScores<'a> {
    index: &'a Bm25Index,
    cache: AHashMap<String, AHashMap<DocumentId, f32>>,
}

impl<'a> SemanticScores<'a> {
    fn new(index: &'a Bm25Index) -> Self {
        Self {
            index,
            cache: AHashMap::new(),
        }
    }

    /// `Some(score)` when the predicate matches the document
    fn evaluate(&mut self, predicate: &Predicate, id: &DocumentId, doc: &Document) -> Option<f32> {
        match predicate {
            Predicate::Semantic { text, .. } => {
                if text.trim().is_empty() {
                    return Some(0.0);
                }
                let index = self.index;
                let scores = self
                    .cache
                    .entry(text.clone())
                    .or_insert_with(|| index.score_all(text));
                scores.get(id).copied()
            }
            structured => structured.matches(doc).then_some(STRUCTURED_MATCH_SCORE),
        }
    }
}

impl SearchStore for MemoryStore {
    fn search(&self, query: &StoreQuery) -> Result<Vec<ScoredDocument>> {
        self.validate(query)?;

        let docs = self.docs.read();
        let order = self.order.read();
        let index = self.index.read();
        let mut semantic = SemanticScores::new(&index);
        let required_should = query.required_should();

        let mut results = Vec::new();
        'docs: for id in order.iter() {
            let Some(doc) = docs.get(id) else { continue };

            for predicate in &query.filter {
                if semantic.evaluate(predicate, id, doc).is_none() {
                    continue 'docs;
                }
            }

            let mut score = 0.0f32;
            for predicate in &query.must {
                match semantic.evaluate(predicate, id, doc) {
                    Some(s) => score += s,
                    None => continue 'docs,
                }
            }

            let mut matched_should = 0;
            for predicate in &query.should {
                if let Some(s) = semantic.evaluate(predicate, id, doc) {
                    matched_should += 1;
                    score += s;
                }
            }
            if matched_should < required_should {
                continue;
            }

            if query.is_match_all() {
                score = STRUCTURED_MATCH_SCORE;
            }

            results.push(ScoredDocument {
                id: id.clone(),
                document: doc.clone(),
                score,
            });
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(query.size);
        debug!(
            filter = query.filter.len(),
            must = query.must.len(),
            should = query.should.len(),
            hits = results.len(),
            "memory store search"
        );
        Ok(results)
    }
}

impl CatalogSource for MemoryStore {
    fn fetch_catalog(&self, schema: &DocumentSchema, max_values: usize) -> Result<ValueCatalog> {
        let docs = self.docs.read();
        debug!(documents = docs.len(), "building catalog from memory store");
        Ok(ValueCatalog::from_documents(docs.values(), schema, max_values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::startup;

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new(DocumentSchema::startups());
        store.upsert(
            DocumentId::from("ledgerly"),
            startup("Ledgerly", "fintech", "San Francisco", "Series A", 12_000_000.0, "Andreessen Horowitz", "payments platform for marketplaces"),
        );
        store.upsert(
            DocumentId::from("cliniq"),
            startup("Cliniq", "healthtech", "Boston", "Seed", 2_000_000.0, "General Catalyst", "clinical workflow automation"),
        );
        store.upsert(
            DocumentId::from("paybridge"),
            startup("PayBridge", "fintech", "New York", "Series A", 14_000_000.0, "Sequoia", "cross-border payments for freelancers"),
        );
        store
    }

    fn ids(results: &[ScoredDocument]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    fn semantic(text: &str) -> Predicate {
        Predicate::Semantic { field: "description".to_string(), text: text.to_string() }
    }

    #[test]
    fn test_match_all_keeps_insertion_order() {
        let store = seeded();
        let results = store.search(&StoreQuery::new(10)).unwrap();
        assert_eq!(ids(&results), vec!["ledgerly", "cliniq", "paybridge"]);
    }

    #[test]
    fn test_filter_gates_and_semantic_orders() {
        let store = seeded();
        let query = StoreQuery::new(10)
            .filter(Predicate::Terms {
                field: "industry".to_string(),
                values: vec!["fintech".to_string()],
            })
            .should(semantic("freelancers payments"));

        let results = store.search(&query).unwrap();
        assert_eq!(ids(&results), vec!["paybridge", "ledgerly"]);
    }

    #[test]
    fn test_filter_without_semantic_match_still_returned() {
        let store = seeded();
        let query = StoreQuery::new(10)
            .filter(Predicate::Terms {
                field: "location".to_string(),
                values: vec!["Boston".to_string()],
            })
            .should(semantic("payments"));

        let results = store.search(&query).unwrap();
        assert_eq!(ids(&results), vec!["cliniq"]);
    }

    #[test]
    fn test_must_semantic_excludes_non_matching() {
        let store = seeded();
        let results = store.search(&StoreQuery::new(10).must(semantic("clinical"))).unwrap();
        assert_eq!(ids(&results), vec!["cliniq"]);
    }

    #[test]
    fn test_minimum_should_match() {
        let store = seeded();
        let query = StoreQuery::new(10)
            .should(Predicate::Terms {
                field: "industry".to_string(),
                values: vec!["fintech".to_string()],
            })
            .should(Predicate::Range {
                field: "funding_amount".to_string(),
                gte: Some(13_000_000.0),
                lte: None,
            })
            .minimum_should_match(2);

        let results = store.search(&query).unwrap();
        assert_eq!(ids(&results), vec!["paybridge"]);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let store = seeded();
        let query = StoreQuery::new(10).filter(Predicate::Terms {
            field: "valuation".to_string(),
            values: vec!["x".to_string()],
        });
        assert!(matches!(store.search(&query), Err(Error::UnknownField(_))));
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let store = seeded();
        let query = StoreQuery::new(10).filter(Predicate::Range {
            field: "industry".to_string(),
            gte: Some(1.0),
            lte: None,
        });
        assert!(matches!(store.search(&query), Err(Error::FieldKindMismatch { .. })));
    }

    #[test]
    fn test_size_truncates() {
        let store = seeded();
        assert_eq!(store.search(&StoreQuery::new(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_and_catalog() {
        let store = seeded();
        store.delete(&DocumentId::from("cliniq")).unwrap();
        assert!(store.delete(&DocumentId::from("cliniq")).is_err());
        assert_eq!(store.count(), 2);

        let catalog = store.fetch_catalog(store.schema(), 100).unwrap();
        assert_eq!(catalog.values("industry"), &["fintech".to_string()]);
    }
}
