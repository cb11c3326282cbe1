//! Dense + sparse score fusion.
//!
//! The dense side contributes its *rank*, not its raw cosine similarity: the
//! i-th dense hit (0-based) scores `1 - i/k`. Similarity scales differ across
//! embedding models, and rank decay keeps them from dominating the weighting.
//! The raw similarity is still carried along and is what the threshold filter
//! looks at.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::sparse::SparseHit;
use crate::catalog::ToolRecord;
use crate::store::NearestHits;

/// Per-query fusion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionParams {
    /// Candidates taken from each ranking and kept after fusion.
    pub k: usize,
    /// Dense weight; the sparse weight is `1 - alpha`.
    pub alpha: f64,
    /// Minimum dense similarity for a candidate to be returned.
    pub threshold: f64,
}

/// A candidate in the fused top-k, before threshold filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub name: String,
    pub fused_score: f64,
    pub dense_score: f64,
    pub sparse_score: f64,
    /// Actual dense similarity; `None` when only the sparse ranking found it.
    pub similarity: Option<f32>,
}

impl RankedCandidate {
    /// Similarity used by the threshold filter. Sparse-only candidates count
    /// as `0.0`.
    pub fn effective_similarity(&self) -> f64 {
        self.similarity.map(f64::from).unwrap_or(0.0)
    }
}

/// A candidate that survived the threshold, with its catalog record.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedCandidate {
    pub candidate: RankedCandidate,
    pub record: ToolRecord,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FusionEngine;

impl FusionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Fuse both rankings into the final top-k list, ordered by fused score.
    ///
    /// `sparse` is expected to be the sparse top-k with normalized scores.
    /// The result does not depend on the threshold.
    pub fn rank(
        &self,
        dense: &NearestHits,
        sparse: &[SparseHit],
        k: usize,
        alpha: f64,
    ) -> Vec<RankedCandidate> {
        if k == 0 {
            return Vec::new();
        }

        let mut candidates = Vec::with_capacity(dense.len() + sparse.len());
        let mut index: HashMap<&str, usize> = HashMap::new();

        for (i, (id, similarity)) in dense.ids.iter().zip(&dense.similarities).enumerate() {
            if index.contains_key(id.as_str()) {
                continue;
            }
            index.insert(id.as_str(), candidates.len());
            candidates.push(RankedCandidate {
                name: id.clone(),
                fused_score: 0.0,
                dense_score: 1.0 - i as f64 / k as f64,
                sparse_score: 0.0,
                similarity: Some(*similarity),
            });
        }

        for hit in sparse {
            match index.get(hit.id.as_str()) {
                Some(&pos) => candidates[pos].sparse_score = hit.score,
                None => {
                    index.insert(hit.id.as_str(), candidates.len());
                    candidates.push(RankedCandidate {
                        name: hit.id.clone(),
                        fused_score: 0.0,
                        dense_score: 0.0,
                        sparse_score: hit.score,
                        similarity: None,
                    });
                }
            }
        }

        for candidate in &mut candidates {
            candidate.fused_score =
                alpha * candidate.dense_score + (1.0 - alpha) * candidate.sparse_score;
        }

        candidates.sort_by(compare_candidates);
        candidates.truncate(k);
        candidates
    }

    /// Keep candidates whose dense similarity reaches `threshold`, attaching
    /// catalog records. Candidates `lookup` cannot resolve are skipped.
    pub fn filter<F>(
        &self,
        ranked: Vec<RankedCandidate>,
        threshold: f64,
        lookup: F,
    ) -> Vec<FusedCandidate>
    where
        F: Fn(&str) -> Option<ToolRecord>,
    {
        ranked
            .into_iter()
            .filter(|candidate| candidate.effective_similarity() >= threshold)
            .filter_map(|candidate| {
                let record = lookup(&candidate.name)?;
                Some(FusedCandidate { candidate, record })
            })
            .collect()
    }

    /// [`rank`](Self::rank) followed by [`filter`](Self::filter).
    pub fn fuse<F>(
        &self,
        dense: &NearestHits,
        sparse: &[SparseHit],
        params: FusionParams,
        lookup: F,
    ) -> Vec<FusedCandidate>
    where
        F: Fn(&str) -> Option<ToolRecord>,
    {
        let ranked = self.rank(dense, sparse, params.k, params.alpha);
        let ranked_count = ranked.len();
        let filtered = self.filter(ranked, params.threshold, lookup);

        tracing::debug!(
            dense = dense.len(),
            sparse = sparse.len(),
            ranked = ranked_count,
            kept = filtered.len(),
            threshold = params.threshold,
            "Fused dense and sparse rankings"
        );
        filtered
    }
}

// Fused score descending, then dense similarity descending, then name.
fn compare_candidates(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    b.fused_score
        .partial_cmp(&a.fused_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.effective_similarity()
                .partial_cmp(&a.effective_similarity())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.name.cmp(&b.name))
}
