//! Keyword ranking and rank fusion.

pub mod fusion;
pub mod sparse;

pub use fusion::{FusedCandidate, FusionEngine, FusionParams, RankedCandidate};
pub use sparse::{SparseHit, SparseRanker};
