//! Catalog storage with vector similarity search.
//!
//! [`CatalogStore`] is the seam between the retrieval engine and a vector
//! index. Any backend offering upsert-by-id, delete-by-id, full scan and
//! cosine k-NN with per-result scores can implement it;
//! [`InMemoryCatalogStore`] is the bundled exact-search implementation.

mod memory;

pub use memory::InMemoryCatalogStore;

use crate::Result;
use crate::catalog::ToolRecord;
use crate::embedding::Vector;

/// Full scan of the catalog, in store order.
///
/// The three vectors are parallel: `documents[i]` and `metadata[i]` belong to
/// `ids[i]`.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadata: Vec<ToolRecord>,
}

impl CatalogSnapshot {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// k-NN search result ordered by descending similarity.
#[derive(Debug, Clone, Default)]
pub struct NearestHits {
    pub ids: Vec<String>,
    /// `1 - cosine_distance`, clamped to `[0, 1]`.
    pub similarities: Vec<f32>,
    pub metadata: Vec<ToolRecord>,
}

impl NearestHits {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub trait CatalogStore: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Insert records, replacing any live record with the same name.
    ///
    /// `vectors[i]` is the embedding of `records[i].searchable_text()`.
    fn upsert(&mut self, records: Vec<ToolRecord>, vectors: Vec<Vector>) -> Result<()>;

    /// Remove records by name. Unknown names are ignored.
    ///
    /// Returns the number of records actually removed.
    fn delete(&mut self, names: &[String]) -> usize;

    /// Remove every record.
    fn clear(&mut self);

    fn get_all(&self) -> CatalogSnapshot;

    fn get(&self, name: &str) -> Option<&ToolRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` records accepted by `filter`, nearest first.
    ///
    /// Returns fewer than `k` hits when fewer records qualify; never fails
    /// because the catalog is small.
    fn search_k_nearest_filtered(
        &self,
        vector: &[f32],
        k: usize,
        filter: &dyn Fn(&ToolRecord) -> bool,
    ) -> Result<NearestHits>;

    fn search_k_nearest(&self, vector: &[f32], k: usize) -> Result<NearestHits> {
        self.search_k_nearest_filtered(vector, k, &|_| true)
    }
}
