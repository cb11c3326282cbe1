//! Text embedding seam.
//!
//! The retrieval engine only depends on the [`Embedder`] trait. Model-backed
//! implementations live outside this crate; [`HashingEmbedder`] is a
//! deterministic, dependency-free implementation for tests and offline use.

mod hashing;

pub use hashing::HashingEmbedder;

use crate::Result;

/// Dense embedding vector.
pub type Vector = Vec<f32>;

/// Maps text to a fixed-dimension vector.
///
/// Implementations must be deterministic for a given model: the same text
/// always yields the same vector.
pub trait Embedder: Send + Sync {
    /// Identifier of the underlying model.
    fn model_id(&self) -> &str;

    /// Dimensionality of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embed a single text. Backend failures are returned as
    /// [`Error::Embedding`](crate::Error::Embedding) and are not masked by
    /// the retrieval engine.
    fn embed(&self, text: &str) -> Result<Vector>;

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Cosine of the angle between two vectors.
///
/// Returns `0.0` for mismatched lengths or zero-magnitude input.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
