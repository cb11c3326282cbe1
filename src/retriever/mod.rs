//! Retrieval strategies behind a common interface.
//!
//! [`HybridRetriever`] fuses dense and sparse rankings; [`LlmSelector`] asks a
//! language model to pick tools. Both return a [`Selection`], so callers can
//! swap one for the other.

pub mod hybrid;
pub mod llm;

pub use hybrid::HybridRetriever;
pub use llm::{LlmSelector, SelectionModel, SelectionRequest, parse_selection};

use std::collections::HashSet;

use async_trait::async_trait;

use crate::Result;
use crate::config::{MAX_TOP_K, MIN_TOP_K};
use crate::shape::GroupedTools;

/// Outcome of a retrieval call.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The relevant tools, grouped by namespace. May be empty.
    Tools(GroupedTools),
    /// Filtering is disabled; the caller should use the entire catalog.
    UseFullCatalog,
}

impl Selection {
    pub fn is_full_catalog(&self) -> bool {
        matches!(self, Selection::UseFullCatalog)
    }

    pub fn tools(&self) -> Option<&GroupedTools> {
        match self {
            Selection::Tools(tools) => Some(tools),
            Selection::UseFullCatalog => None,
        }
    }

    pub fn into_tools(self) -> Option<GroupedTools> {
        match self {
            Selection::Tools(tools) => Some(tools),
            Selection::UseFullCatalog => None,
        }
    }

    /// Selected tool names grouped by namespace, in rank order within each
    /// namespace; empty for the full-catalog sentinel.
    pub fn tool_names(&self) -> Vec<String> {
        self.tools().map(GroupedTools::tool_names).unwrap_or_default()
    }
}

#[async_trait]
pub trait Retriever: Send + Sync {
    fn name(&self) -> &str;

    /// Select tools relevant to `query`. `k` overrides the configured top-k.
    async fn retrieve(&self, query: &str, k: Option<usize>) -> Result<Selection>;
}

/// Per-call overrides for hybrid retrieval.
///
/// Values are clamped into their valid ranges when set, so overrides never
/// turn into query-time errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrieveOptions {
    k: Option<usize>,
    alpha: Option<f64>,
    threshold: Option<f64>,
    exclude_namespaces: HashSet<String>,
}

impl RetrieveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn k(mut self, k: usize) -> Self {
        self.k = Some(k.clamp(MIN_TOP_K, MAX_TOP_K));
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(clamp_unit(alpha));
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(clamp_unit(threshold));
        self
    }

    /// Drop tools from `namespace` before fusion.
    pub fn exclude_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.exclude_namespaces.insert(namespace.into());
        self
    }

    pub fn exclude_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_namespaces
            .extend(namespaces.into_iter().map(Into::into));
        self
    }

    pub fn k_override(&self) -> Option<usize> {
        self.k
    }

    pub fn alpha_override(&self) -> Option<f64> {
        self.alpha
    }

    pub fn threshold_override(&self) -> Option<f64> {
        self.threshold
    }

    pub fn is_excluded(&self, namespace: Option<&str>) -> bool {
        namespace.is_some_and(|ns| self.exclude_namespaces.contains(ns))
    }

    pub fn has_exclusions(&self) -> bool {
        !self.exclude_namespaces.is_empty()
    }
}

// NaN maps to 0.0 so it can never slip past the threshold check.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
