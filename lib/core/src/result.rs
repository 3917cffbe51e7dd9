//! Ranked and fused result types

use crate::document::{Document, DocumentId};
use serde::{Deserialize, Serialize};

/// A document as returned by a store, with its raw relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: DocumentId,
    pub document: Document,
    pub score: f32,
}

/// A document at a position in one retriever's ranked list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub id: DocumentId,
    pub document: Document,
    /// 1-based position in the source list
    pub rank: usize,
    pub score: f32,
}

impl RankedHit {
    /// Order store results by score, keeping store order among equal
    /// scores, and number them from 1.
    pub fn rank_all(mut docs: Vec<ScoredDocument>) -> Vec<RankedHit> {
        docs.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        docs.into_iter()
            .enumerate()
            .map(|(i, doc)| RankedHit {
                id: doc.id,
                document: doc.document,
                rank: i + 1,
                score: doc.score,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedHit {
    pub id: DocumentId,
    pub document: Document,
    pub score: f64,
}

/// Final ordered result set; possibly empty, never an error
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub hits: Vec<FusedHit>,
}

impl FusedResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A single ranked list taken as-is
    pub fn from_ranked(hits: Vec<RankedHit>, limit: usize) -> Self {
        let hits = hits
            .into_iter()
            .take(limit)
            .map(|hit| FusedHit {
                id: hit.id,
                document: hit.document,
                score: f64::from(hit.score),
            })
            .collect();
        Self { hits }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::startup;

    fn scored(id: &str, score: f32) -> ScoredDocument {
        ScoredDocument {
            id: DocumentId::from(id),
            document: startup(id, "fintech", "Austin", "Seed", 1.0, "YC", "x"),
            score,
        }
    }

    #[test]
    fn test_rank_all_sorts_and_numbers_from_one() {
        let ranked = RankedHit::rank_all(vec![scored("a", 0.1), scored("b", 0.9), scored("c", 0.5)]);
        let order: Vec<_> = ranked.iter().map(|h| (h.id.as_str(), h.rank)).collect();
        assert_eq!(order, vec![("b", 1), ("c", 2), ("a", 3)]);
    }

    #[test]
    fn test_rank_all_is_stable_on_ties() {
        let ranked = RankedHit::rank_all(vec![scored("x", 1.0), scored("y", 1.0), scored("z", 1.0)]);
        let ids: Vec<_> = ranked.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_from_ranked_truncates() {
        let ranked = RankedHit::rank_all(vec![scored("a", 3.0), scored("b", 2.0), scored("c", 1.0)]);
        let result = FusedResult::from_ranked(ranked, 2);
        assert_eq!(result.ids(), vec!["a", "b"]);
        assert!((result.hits[0].score - 3.0).abs() < 1e-9);
    }
}
