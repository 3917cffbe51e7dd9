// BM25 index over the semantic text field of stored documents
use crate::document::DocumentId;
use ahash::AHashMap;

/// Words too common in search requests to carry any signal
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of", "on",
    "or", "that", "the", "to", "with", "find", "show", "me", "companies", "startups",
];

#[derive(Debug, Clone)]
pub struct Bm25Index {
    // term -> (doc -> term frequency)
    postings: AHashMap<String, AHashMap<DocumentId, u32>>,
    doc_lengths: AHashMap<DocumentId, u32>,
    total_length: u64,
    k1: f32,
    b: f32,
}

impl Bm25Index {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(1.2, 0.75)
    }

    #[must_use]
    pub fn with_params(k1: f32, b: f32) -> Self {
        Self {
            postings: AHashMap::new(),
            doc_lengths: AHashMap::new(),
            total_length: 0,
            k1,
            b,
        }
    }

    /// Lowercase, split on anything that is not alphanumeric, drop
    /// single characters and stopwords
    pub fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 1 && !STOPWORDS.contains(t))
            .map(str::to_string)
            .collect()
    }

    pub fn insert(&mut self, id: &DocumentId, text: &str) {
        self.remove(id);

        let tokens = Self::tokenize(text);
        for token in &tokens {
            *self
                .postings
                .entry(token.clone())
                .or_default()
                .entry(id.clone())
                .or_insert(0) += 1;
        }
        self.total_length += tokens.len() as u64;
        self.doc_lengths.insert(id.clone(), tokens.len() as u32);
    }

    pub fn remove(&mut self, id: &DocumentId) {
        if let Some(len) = self.doc_lengths.remove(id) {
            self.total_length = self.total_length.saturating_sub(u64::from(len));
            self.postings.retain(|_, docs| {
                docs.remove(id);
                !docs.is_empty()
            });
        }
    }

    /// Score every document sharing at least one term with `query`.
    /// Documents without a shared term are absent from the map.
    pub fn score_all(&self, query: &str) -> AHashMap<DocumentId, f32> {
        let mut scores = AHashMap::new();
        let n = self.doc_lengths.len() as f32;
        if n == 0.0 {
            return scores;
        }
        let avgdl = (self.total_length as f32 / n).max(1.0);

        let mut terms = Self::tokenize(query);
        terms.sort();
        terms.dedup();

        for term in terms {
            let Some(docs) = self.postings.get(&term) else {
                continue;
            };
            let df = docs.len() as f32;
            // Lucene-style idf, always positive
            let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();

            for (id, &tf) in docs {
                let dl = self.doc_lengths.get(id).copied().unwrap_or(0) as f32;
                let tf = tf as f32;
                let norm = tf + self.k1 * (1.0 - self.b + self.b * dl / avgdl);
                *scores.entry(id.clone()).or_insert(0.0) += idf * tf * (self.k1 + 1.0) / norm;
            }
        }
        scores
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.doc_lengths.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.doc_lengths.is_empty()
    }
}

impl Default for Bm25Index {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DocumentId {
        DocumentId::from(s)
    }

    #[test]
    fn test_tokenize_drops_noise() {
        assert_eq!(
            Bm25Index::tokenize("Find early-stage AI startups in the U.S."),
            vec!["early", "stage", "ai"]
        );
    }

    #[test]
    fn test_score_prefers_term_overlap() {
        let mut index = Bm25Index::new();
        index.insert(&id("a"), "payments platform for small merchants");
        index.insert(&id("b"), "clinical trial software");
        index.insert(&id("c"), "payments and lending for merchants in Latin America");

        let scores = index.score_all("merchant payments");
        assert!(scores.contains_key(&id("a")));
        assert!(scores.contains_key(&id("c")));
        assert!(!scores.contains_key(&id("b")));
        assert!(scores[&id("a")] > 0.0);
    }

    #[test]
    fn test_reinsert_replaces_document() {
        let mut index = Bm25Index::new();
        index.insert(&id("a"), "robotics");
        index.insert(&id("a"), "biotech");

        assert_eq!(index.len(), 1);
        assert!(index.score_all("robotics").is_empty());
        assert!(index.score_all("biotech").contains_key(&id("a")));
    }

    #[test]
    fn test_remove() {
        let mut index = Bm25Index::new();
        index.insert(&id("a"), "robotics");
        index.remove(&id("a"));
        assert!(index.is_empty());
        assert!(index.score_all("robotics").is_empty());
    }
}
