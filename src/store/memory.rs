//! Exact in-memory catalog store.

use std::collections::HashMap;

use super::{CatalogSnapshot, CatalogStore, NearestHits};
use crate::catalog::ToolRecord;
use crate::embedding::{Vector, cosine_similarity};
use crate::{Error, Result};

#[derive(Debug, Clone)]
struct StoredTool {
    record: ToolRecord,
    document: String,
    vector: Vector,
}

/// Brute-force cosine store.
///
/// Records keep their first-insertion position across upserts, so full scans
/// and similarity ties are deterministic. Suitable for catalogs of up to a
/// few thousand tools.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    entries: Vec<StoredTool>,
    positions: HashMap<String, usize>,
    dimension: Option<usize>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects vectors of any other dimensionality.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            ..Self::default()
        }
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn check_dimension(&self, expected: Option<usize>, actual: usize) -> Result<()> {
        match expected {
            Some(expected) if expected != actual => {
                Err(Error::InvalidDimension { expected, actual })
            }
            _ => Ok(()),
        }
    }

    fn reindex(&mut self) {
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.record.name.clone(), i))
            .collect();
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn upsert(&mut self, records: Vec<ToolRecord>, vectors: Vec<Vector>) -> Result<()> {
        if records.len() != vectors.len() {
            return Err(Error::LengthMismatch {
                records: records.len(),
                vectors: vectors.len(),
            });
        }

        // Validate the whole batch before touching state.
        let mut dimension = self.dimension;
        for vector in &vectors {
            self.check_dimension(dimension, vector.len())?;
            dimension.get_or_insert(vector.len());
        }
        self.dimension = dimension;

        for (record, vector) in records.into_iter().zip(vectors) {
            let entry = StoredTool {
                document: record.searchable_text(),
                record,
                vector,
            };
            match self.positions.get(&entry.record.name) {
                Some(&pos) => self.entries[pos] = entry,
                None => {
                    self.positions
                        .insert(entry.record.name.clone(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }
        Ok(())
    }

    fn delete(&mut self, names: &[String]) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !names.contains(&entry.record.name));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    fn get_all(&self) -> CatalogSnapshot {
        let mut snapshot = CatalogSnapshot::default();
        for entry in &self.entries {
            snapshot.ids.push(entry.record.name.clone());
            snapshot.documents.push(entry.document.clone());
            snapshot.metadata.push(entry.record.clone());
        }
        snapshot
    }

    fn get(&self, name: &str) -> Option<&ToolRecord> {
        self.positions
            .get(name)
            .map(|&pos| &self.entries[pos].record)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn search_k_nearest_filtered(
        &self,
        vector: &[f32],
        k: usize,
        filter: &dyn Fn(&ToolRecord) -> bool,
    ) -> Result<NearestHits> {
        if self.entries.is_empty() || k == 0 {
            return Ok(NearestHits::default());
        }
        self.check_dimension(self.dimension, vector.len())?;

        let mut scored: Vec<(&StoredTool, f32)> = self
            .entries
            .iter()
            .filter(|entry| filter(&entry.record))
            .map(|entry| {
                let similarity = cosine_similarity(vector, &entry.vector).clamp(0.0, 1.0);
                (entry, similarity)
            })
            .collect();

        // Stable sort: equal similarities keep store order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        let mut hits = NearestHits::default();
        for (entry, similarity) in scored {
            hits.ids.push(entry.record.name.clone());
            hits.similarities.push(similarity);
            hits.metadata.push(entry.record.clone());
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<ToolRecord> {
        vec![
            ToolRecord::new("tool1", "First tool"),
            ToolRecord::new("tool2", "Second tool"),
            ToolRecord::new("tool3", "Third tool"),
        ]
    }

    fn flat_vectors(n: usize) -> Vec<Vector> {
        (0..n).map(|_| vec![0.1, 0.2, 0.3]).collect()
    }

    #[test]
    fn test_upsert_and_get_all() {
        let mut store = InMemoryCatalogStore::new();
        store.upsert(sample_records(), flat_vectors(3)).unwrap();

        let all = store.get_all();
        assert_eq!(all.ids, vec!["tool1", "tool2", "tool3"]);
        assert_eq!(all.documents[0], "tool1 First tool");
        assert_eq!(all.metadata.len(), 3);
        assert_eq!(store.dimension(), Some(3));
    }

    #[test]
    fn test_upsert_replaces_by_name() {
        let mut store = InMemoryCatalogStore::new();
        store.upsert(sample_records(), flat_vectors(3)).unwrap();
        store
            .upsert(
                vec![ToolRecord::new("tool2", "Updated second tool")],
                flat_vectors(1),
            )
            .unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("tool2").unwrap().description, "Updated second tool");
        // Position is kept.
        assert_eq!(store.get_all().ids[1], "tool2");
    }

    #[test]
    fn test_upsert_length_mismatch() {
        let mut store = InMemoryCatalogStore::new();
        let err = store.upsert(sample_records(), flat_vectors(2)).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { records: 3, vectors: 2 }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_upsert_dimension_mismatch_is_atomic() {
        let mut store = InMemoryCatalogStore::with_dimension(3);
        let err = store
            .upsert(
                vec![ToolRecord::new("a", "A"), ToolRecord::new("b", "B")],
                vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0]],
            )
            .unwrap_err();

        assert!(matches!(err, Error::InvalidDimension { expected: 3, actual: 2 }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let mut store = InMemoryCatalogStore::new();
        store
            .upsert(
                vec![
                    ToolRecord::new("weather", "Get weather info"),
                    ToolRecord::new("news", "Get latest news"),
                ],
                vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]],
            )
            .unwrap();

        let hits = store.search_k_nearest(&[0.9, 0.1, 0.0], 2).unwrap();
        assert_eq!(hits.ids, vec!["weather", "news"]);
        assert!(hits.similarities[0] > hits.similarities[1]);
        assert_eq!(hits.metadata[0].name, "weather");
    }

    #[test]
    fn test_search_with_fewer_records_than_k() {
        let mut store = InMemoryCatalogStore::new();
        store.upsert(sample_records(), flat_vectors(3)).unwrap();

        let hits = store.search_k_nearest(&[0.1, 0.2, 0.3], 10).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_search_clamps_opposite_direction() {
        let mut store = InMemoryCatalogStore::new();
        store
            .upsert(vec![ToolRecord::new("a", "A")], vec![vec![1.0, 0.0]])
            .unwrap();

        let hits = store.search_k_nearest(&[-1.0, 0.0], 1).unwrap();
        assert_eq!(hits.similarities, vec![0.0]);
    }

    #[test]
    fn test_search_filtered() {
        let mut store = InMemoryCatalogStore::new();
        store
            .upsert(
                vec![
                    ToolRecord::new("a", "A").namespace("x"),
                    ToolRecord::new("b", "B").namespace("y"),
                ],
                vec![vec![1.0, 0.0], vec![0.9, 0.1]],
            )
            .unwrap();

        let hits = store
            .search_k_nearest_filtered(&[1.0, 0.0], 2, &|r| r.namespace.as_deref() != Some("x"))
            .unwrap();
        assert_eq!(hits.ids, vec!["b"]);
    }

    #[test]
    fn test_search_query_dimension_mismatch() {
        let mut store = InMemoryCatalogStore::new();
        store.upsert(sample_records(), flat_vectors(3)).unwrap();
        assert!(store.search_k_nearest(&[1.0], 1).is_err());
    }

    #[test]
    fn test_delete() {
        let mut store = InMemoryCatalogStore::new();
        store.upsert(sample_records(), flat_vectors(3)).unwrap();

        assert_eq!(store.delete(&["tool2".to_string()]), 1);
        let all = store.get_all();
        assert_eq!(all.ids, vec!["tool1", "tool3"]);
        assert!(store.get("tool3").is_some());
        assert!(store.get("tool2").is_none());
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut store = InMemoryCatalogStore::new();
        store.upsert(sample_records(), flat_vectors(3)).unwrap();

        assert_eq!(store.delete(&["missing".to_string()]), 0);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_empty_store() {
        let store = InMemoryCatalogStore::new();
        let all = store.get_all();
        assert!(all.ids.is_empty());
        assert!(all.documents.is_empty());
        assert!(store.search_k_nearest(&[1.0, 0.0], 5).unwrap().is_empty());
    }
}
