//! Reciprocal Rank Fusion

use ahash::AHashMap;
use dealscout_core::{FusedHit, FusedResult, RankedHit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RrfParams {
    pub rank_constant: usize,
    /// Positions per list that contribute; the rest are ignored
    pub rank_window_size: usize,
}

impl Default for RrfParams {
    fn default() -> Self {
        Self {
            rank_constant: 20,
            rank_window_size: 100,
        }
    }
}

impl RrfParams {
    /// Contribution of 1-based position `rank`
    #[inline]
    pub fn contribution(&self, rank: usize) -> f64 {
        1.0 / (self.rank_constant + rank) as f64
    }
}

/// Fuse ranked lists by summing `1 / (rank_constant + rank)` over every
/// list a document appears in.
///
/// Rank is the 1-based position within each list. Equal fused scores keep
/// the order in which documents were first seen, walking the lists in
/// order. The result holds at most `limit` documents.
pub fn reciprocal_rank_fusion(lists: &[Vec<RankedHit>], params: RrfParams, limit: usize) -> FusedResult {
    let mut hits: Vec<FusedHit> = Vec::new();
    let mut slots: AHashMap<&str, usize> = AHashMap::new();

    for list in lists {
        for (position, hit) in list.iter().take(params.rank_window_size).enumerate() {
            let contribution = params.contribution(position + 1);
            match slots.get(hit.id.as_str()) {
                Some(&slot) => hits[slot].score += contribution,
                None => {
                    slots.insert(hit.id.as_str(), hits.len());
                    hits.push(FusedHit {
                        id: hit.id.clone(),
                        document: hit.document.clone(),
                        score: contribution,
                    });
                }
            }
        }
    }

    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(limit);
    FusedResult { hits }
}
