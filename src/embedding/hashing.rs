//! Feature-hashing embedder.

use super::{Embedder, Vector};
use crate::{Error, Result};

const DEFAULT_DIMENSIONS: usize = 256;
const TRIGRAM_WEIGHT: f32 = 0.5;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic bag-of-words embedder.
///
/// Words (split on non-alphanumeric characters, lowercased) and their
/// character trigrams are hashed into signed buckets and the result is
/// L2-normalized. Texts sharing vocabulary point in similar directions, which
/// is enough to exercise dense retrieval without a model download.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    model_id: String,
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::Config(
                "embedding dimension must be positive".into(),
            ));
        }
        Ok(Self {
            model_id: format!("hashing-{}", dimensions),
            dimensions,
        })
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    fn accumulate(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            model_id: format!("hashing-{}", DEFAULT_DIMENSIONS),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();

        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            self.accumulate(&mut vector, word, 1.0);

            let chars: Vec<char> = word.chars().collect();
            if chars.len() > 3 {
                for window in chars.windows(3) {
                    let trigram: String = window.iter().collect();
                    self.accumulate(&mut vector, &format!("#{}", trigram), TRIGRAM_WEIGHT);
                }
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_embedding_is_deterministic() {
        let embedder = HashingEmbedder::default();
        let a = embedder.embed("get weather forecast").unwrap();
        let b = embedder.embed("get weather forecast").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_embedding_has_configured_length() {
        let embedder = HashingEmbedder::new(64).unwrap();
        assert_eq!(embedder.embed("anything").unwrap().len(), 64);
        assert_eq!(embedder.dimensions(), 64);
        assert_eq!(embedder.model_id(), "hashing-64");
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let embedder = HashingEmbedder::default();
        let query = embedder.embed("weather in Paris").unwrap();
        let weather = embedder.embed("get_weather Current weather for a city").unwrap();
        let email = embedder.embed("send_email Send an email message").unwrap();

        assert!(cosine_similarity(&query, &weather) > cosine_similarity(&query, &email));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(8).unwrap();
        assert!(embedder.embed("  ").unwrap().iter().all(|x| *x == 0.0));
    }
}
