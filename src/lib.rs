//! # tools-rag
//!
//! Query-time selection of relevant tools from a large tool catalog.
//!
//! An agent with hundreds of tools cannot afford to put every tool schema in
//! its context. This crate picks the few tools that matter for a query by
//! fusing a dense (embedding) ranking with a sparse (BM25) ranking, filtering
//! on embedding similarity, and grouping the survivors by namespace.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tools_rag::{HashingEmbedder, HybridRetriever, RetrievalConfig, Selection, ToolRecord};
//!
//! fn main() -> Result<(), tools_rag::Error> {
//!     let config = RetrievalConfig::builder().top_k(5).threshold(0.05).build()?;
//!     let mut retriever = HybridRetriever::new(config, HashingEmbedder::default());
//!
//!     retriever.populate(vec![
//!         ToolRecord::new("get_weather", "Get current weather for a city").namespace("weather-mcp"),
//!         ToolRecord::new("send_email", "Send an email message").namespace("mail"),
//!     ])?;
//!
//!     match retriever.retrieve_with("what's the weather in Paris", &Default::default())? {
//!         Selection::Tools(tools) => {
//!             for group in tools.groups() {
//!                 println!("{}: {} tools", group.namespace, group.tools.len());
//!             }
//!         }
//!         Selection::UseFullCatalog => println!("filtering disabled"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Swapping strategies
//!
//! [`HybridRetriever`] and [`LlmSelector`] both implement [`Retriever`], so
//! code written against `&dyn Retriever` can compare them directly, e.g. with
//! [`evaluation::evaluate`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod catalog;
pub mod config;
pub mod embedding;
pub mod evaluation;
pub mod retriever;
pub mod search;
pub mod shape;
pub mod store;

pub use catalog::ToolRecord;
pub use config::{
    ConfigBuilder, ConfigError, ConfigProvider, ConfigProviderExt, ConfigResult, RetrievalConfig,
    RetrievalConfigBuilder,
};
pub use embedding::{Embedder, HashingEmbedder, Vector, cosine_similarity};
pub use evaluation::{
    EvaluationCase, EvaluationReport, EvaluationResult, calculate_rank, evaluate,
};
pub use retriever::{
    HybridRetriever, LlmSelector, RetrieveOptions, Retriever, Selection, SelectionModel,
    SelectionRequest, parse_selection,
};
pub use search::{FusedCandidate, FusionEngine, FusionParams, RankedCandidate, SparseRanker};
pub use shape::{DEFAULT_NAMESPACE, GroupedTools, NamespaceGroup, PublicTool, group_by_namespace};
pub use store::{CatalogSnapshot, CatalogStore, InMemoryCatalogStore, NearestHits};

/// Error type for tools-rag operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A vector does not match the store's dimensionality.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// Records and vectors passed to an upsert differ in length.
    #[error("Got {records} records but {vectors} vectors")]
    LengthMismatch { records: usize, vectors: usize },

    /// The embedding backend failed.
    #[error("Embedding failed: {0}")]
    Embedding(String),

    /// The selection model could not be reached or returned an error.
    #[error("Selection model failed: {0}")]
    SelectionModel(String),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// File system operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Out-of-range or missing settings
    Configuration,
    /// Embedding or selection model failures outside this crate
    Backend,
    /// Malformed arguments to a store operation
    InvalidInput,
    /// IO and serialization errors
    Internal,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) => ErrorCategory::Configuration,
            Error::Embedding(_) | Error::SelectionModel(_) => ErrorCategory::Backend,
            Error::InvalidDimension { .. } | Error::LengthMismatch { .. } => {
                ErrorCategory::InvalidInput
            }
            Error::Json(_) | Error::Io(_) => ErrorCategory::Internal,
        }
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn is_backend_error(&self) -> bool {
        self.category() == ErrorCategory::Backend
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Serialization(e) => Error::Json(e),
            ConfigError::Io(e) => Error::Io(e),
            other => Error::Config(other.to_string()),
        }
    }
}

/// Result type for tools-rag operations.
pub type Result<T> = std::result::Result<T, Error>;
