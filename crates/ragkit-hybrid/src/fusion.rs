//! Weighted score fusion of dense and sparse rankings.
//!
//! Scores are combined as-is: cosine similarity lives in [-1, 1] while BM25
//! is unbounded, so with the default weights a strong lexical match can
//! outweigh any dense signal. This is reported, not corrected.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use ragkit_core::types::{FusedHit, SearchHit};

/// `[fusion]` in the configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FusionWeights {
    pub dense: f64,
    pub sparse: f64,
}

impl Default for FusionWeights {
    fn default() -> Self { Self { dense: 0.6, sparse: 0.4 } }
}

/// `0.6 * dense + 0.4 * sparse` over the union of both lists.
pub fn fuse(dense: &[SearchHit], sparse: &[SearchHit], top_k: usize) -> Vec<FusedHit> {
    fuse_weighted(dense, sparse, top_k, FusionWeights::default())
}

/// Merge two rankings keyed by chunk id.
///
/// Every id of either list appears exactly once (before truncation), with
/// the missing side at 0.0 and repeated ids summed. Ordered by fused score,
/// then chunk id.
pub fn fuse_weighted(dense: &[SearchHit], sparse: &[SearchHit], top_k: usize, weights: FusionWeights) -> Vec<FusedHit> {
    let mut combined: HashMap<&str, (f64, f64)> = HashMap::with_capacity(dense.len() + sparse.len());
    for hit in dense { combined.entry(hit.id.as_str()).or_default().0 += hit.score; }
    for hit in sparse { combined.entry(hit.id.as_str()).or_default().1 += hit.score; }

    let sparse_max = sparse.iter().map(|h| h.score).fold(f64::NEG_INFINITY, f64::max);
    if sparse_max > 1.0 {
        tracing::warn!(sparse_max, "sparse scores exceed the cosine range; fused ranking is dominated by BM25");
    }

    let mut fused: Vec<FusedHit> = combined
        .into_iter()
        .map(|(id, (d, s))| FusedHit {
            chunk_id: id.to_string(),
            dense_score: d,
            sparse_score: s,
            fused_score: weights.dense * d + weights.sparse * s,
        })
        .collect();
    fused.sort_by(|a, b| b.fused_score.total_cmp(&a.fused_score).then_with(|| a.chunk_id.cmp(&b.chunk_id)));
    fused.truncate(top_k);
    tracing::debug!(dense = dense.len(), sparse = sparse.len(), fused = fused.len(), "fusion complete");
    fused
}
