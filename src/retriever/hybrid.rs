//! Hybrid dense + sparse retrieval over an owned catalog.

use async_trait::async_trait;

use super::{RetrieveOptions, Retriever, Selection};
use crate::Result;
use crate::catalog::ToolRecord;
use crate::config::RetrievalConfig;
use crate::embedding::{Embedder, Vector};
use crate::search::{FusedCandidate, FusionEngine, FusionParams, SparseRanker};
use crate::shape::group_by_namespace;
use crate::store::{CatalogStore, InMemoryCatalogStore};

/// Owns the catalog store and the sparse ranker derived from it.
///
/// Every mutation rebuilds the sparse ranker from the store before
/// returning, so a query never sees a stale keyword index. Mutations take
/// `&mut self`; wrap the retriever in a lock to share it between writers
/// and readers.
///
/// ```rust,no_run
/// use tools_rag::{HashingEmbedder, HybridRetriever, RetrievalConfig, ToolRecord};
///
/// # fn example() -> tools_rag::Result<()> {
/// let mut retriever = HybridRetriever::new(RetrievalConfig::default(), HashingEmbedder::default());
/// retriever.populate(vec![
///     ToolRecord::new("get_weather", "Get current weather for a city").namespace("weather-mcp"),
/// ])?;
/// let selection = retriever.retrieve_with("weather in Paris", &Default::default())?;
/// # Ok(())
/// # }
/// ```
pub struct HybridRetriever<E, S = InMemoryCatalogStore> {
    config: RetrievalConfig,
    embedder: E,
    store: S,
    sparse: SparseRanker,
    fusion: FusionEngine,
}

impl<E: Embedder> HybridRetriever<E> {
    pub fn new(config: RetrievalConfig, embedder: E) -> Self {
        Self::with_store(config, embedder, InMemoryCatalogStore::new())
    }
}

impl<E: Embedder, S: CatalogStore> HybridRetriever<E, S> {
    /// Build over an existing store. The sparse ranker is derived from
    /// whatever the store already holds.
    pub fn with_store(config: RetrievalConfig, embedder: E, store: S) -> Self {
        if config.embedding_model() != embedder.model_id() {
            tracing::debug!(
                configured = config.embedding_model(),
                embedder = embedder.model_id(),
                "Embedder model differs from configured model"
            );
        }

        let mut retriever = Self {
            config,
            embedder,
            store,
            sparse: SparseRanker::new(),
            fusion: FusionEngine::new(),
        };
        retriever.rebuild_sparse();
        retriever
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of live tools in the store.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of documents the sparse ranker was last built over.
    pub fn corpus_size(&self) -> usize {
        self.sparse.len()
    }

    pub fn get(&self, name: &str) -> Option<&ToolRecord> {
        self.store.get(name)
    }

    /// Bulk initial load. Upserts: tools already in the catalog but absent
    /// from `records` are kept. Use [`replace_all`](Self::replace_all) to
    /// drop them.
    pub fn populate(&mut self, records: Vec<ToolRecord>) -> Result<()> {
        let count = records.len();
        self.upsert(records)?;
        tracing::info!(
            tools = count,
            catalog = self.store.len(),
            store = self.store.name(),
            "Populated tool catalog"
        );
        Ok(())
    }

    /// Insert or update tools by name.
    pub fn add(&mut self, records: Vec<ToolRecord>) -> Result<()> {
        let count = records.len();
        self.upsert(records)?;
        tracing::debug!(tools = count, catalog = self.store.len(), "Added tools");
        Ok(())
    }

    /// Replace the whole catalog with `records`.
    ///
    /// Embeddings are computed before the store is cleared, so an embedding
    /// failure leaves the previous catalog intact.
    pub fn replace_all(&mut self, records: Vec<ToolRecord>) -> Result<()> {
        let vectors = self.embed_records(&records)?;
        self.store.clear();
        let result = self.store.upsert(records, vectors);
        self.rebuild_sparse();
        result?;
        tracing::info!(catalog = self.store.len(), "Replaced tool catalog");
        Ok(())
    }

    /// Remove tools by name. Unknown names are ignored. Returns how many
    /// tools were removed.
    pub fn remove<I, N>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let removed = self.store.delete(&names);
        self.rebuild_sparse();
        tracing::debug!(
            requested = names.len(),
            removed,
            catalog = self.store.len(),
            "Removed tools"
        );
        removed
    }

    /// Rebuild the sparse ranker from the store's current contents.
    pub fn rebuild_sparse(&mut self) {
        let snapshot = self.store.get_all();
        self.sparse.rebuild(&snapshot.ids, &snapshot.documents);
    }

    /// Fused candidates that pass the threshold, in fused-score order.
    ///
    /// Exposes the per-candidate scores behind
    /// [`retrieve_with`](Self::retrieve_with). Ignores `filter_tools`.
    pub fn candidates(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> Result<Vec<FusedCandidate>> {
        if self.store.is_empty() {
            return Ok(Vec::new());
        }

        let params = FusionParams {
            k: options.k_override().unwrap_or(self.config.top_k()),
            alpha: options.alpha_override().unwrap_or(self.config.alpha()),
            threshold: options
                .threshold_override()
                .unwrap_or(self.config.threshold()),
        };

        let query_vector = self.embedder.embed(query)?;
        let dense = self.store.search_k_nearest_filtered(
            &query_vector,
            params.k,
            &|record: &ToolRecord| !options.is_excluded(record.namespace.as_deref()),
        )?;
        let sparse = self.sparse.top_k_matching(query, params.k, |id| {
            self.store
                .get(id)
                .is_some_and(|record| !options.is_excluded(record.namespace.as_deref()))
        });

        tracing::debug!(
            dense = dense.len(),
            sparse = sparse.len(),
            k = params.k,
            alpha = params.alpha,
            "Collected candidates"
        );

        Ok(self
            .fusion
            .fuse(&dense, &sparse, params, |name| self.store.get(name).cloned()))
    }

    /// Retrieve with call-site overrides.
    ///
    /// Returns [`Selection::UseFullCatalog`] when filtering is disabled, and
    /// an empty grouping when the catalog is empty or the threshold rejects
    /// every candidate.
    pub fn retrieve_with(&self, query: &str, options: &RetrieveOptions) -> Result<Selection> {
        let span = tracing::debug_span!(
            "tools_rag.retrieve",
            retriever = "hybrid",
            catalog = self.store.len()
        );
        let _enter = span.enter();

        if !self.config.filter_tools() {
            tracing::debug!("Filtering disabled, using full catalog");
            return Ok(Selection::UseFullCatalog);
        }

        let candidates = self.candidates(query, options)?;
        let grouped = group_by_namespace(candidates.into_iter().map(|c| c.record));
        tracing::debug!(
            query = %query,
            tools = grouped.len(),
            namespaces = grouped.groups().len(),
            "Retrieved tools"
        );
        Ok(Selection::Tools(grouped))
    }

    fn upsert(&mut self, records: Vec<ToolRecord>) -> Result<()> {
        let vectors = self.embed_records(&records)?;
        let result = self.store.upsert(records, vectors);
        self.rebuild_sparse();
        result
    }

    fn embed_records(&self, records: &[ToolRecord]) -> Result<Vec<Vector>> {
        let texts: Vec<String> = records.iter().map(ToolRecord::searchable_text).collect();
        self.embedder.embed_batch(&texts)
    }
}

#[async_trait]
impl<E: Embedder, S: CatalogStore> Retriever for HybridRetriever<E, S> {
    fn name(&self) -> &str {
        "hybrid"
    }

    async fn retrieve(&self, query: &str, k: Option<usize>) -> Result<Selection> {
        let options = match k {
            Some(k) => RetrieveOptions::new().k(k),
            None => RetrieveOptions::new(),
        };
        self.retrieve_with(query, &options)
    }
}

impl<E: Embedder, S: CatalogStore> std::fmt::Debug for HybridRetriever<E, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HybridRetriever")
            .field("config", &self.config)
            .field("embedder", &self.embedder.model_id())
            .field("store", &self.store.name())
            .field("tools", &self.store.len())
            .finish()
    }
}
