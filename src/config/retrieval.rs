//! Validated retrieval settings.

use serde::Serialize;

use super::provider::{ConfigProvider, ConfigProviderExt};
use super::{ConfigError, ConfigResult, ValidationErrors};

pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-mpnet-base-v2";
pub const DEFAULT_ALPHA: f64 = 0.8;
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_THRESHOLD: f64 = 0.01;
pub const MIN_TOP_K: usize = 1;
pub const MAX_TOP_K: usize = 50;

/// Settings for a retrieval engine.
///
/// Every value is range-checked when the config is built, so a constructed
/// `RetrievalConfig` never fails at query time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalConfig {
    embedding_model: String,
    alpha: f64,
    top_k: usize,
    threshold: f64,
    filter_tools: bool,
}

impl RetrievalConfig {
    pub fn builder() -> RetrievalConfigBuilder {
        RetrievalConfigBuilder::default()
    }

    /// Load settings from a provider, falling back to defaults for missing keys.
    pub async fn from_provider(provider: &dyn ConfigProvider) -> ConfigResult<Self> {
        let mut builder = Self::builder();

        if let Some(model) = provider.get_raw("embedding_model").await? {
            builder = builder.embedding_model(model);
        }
        if let Some(alpha) = provider.get::<f64>("alpha").await? {
            builder = builder.alpha(alpha);
        }
        if let Some(top_k) = provider.get::<usize>("top_k").await? {
            builder = builder.top_k(top_k);
        }
        if let Some(threshold) = provider.get::<f64>("threshold").await? {
            builder = builder.threshold(threshold);
        }
        if let Some(filter_tools) = provider.get::<bool>("filter_tools").await? {
            builder = builder.filter_tools(filter_tools);
        }

        let config = builder.build()?;
        tracing::debug!(
            provider = provider.name(),
            alpha = config.alpha,
            top_k = config.top_k,
            threshold = config.threshold,
            filter_tools = config.filter_tools,
            "Loaded retrieval config"
        );
        Ok(config)
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Weight of the dense ranking in fusion.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `false` means callers should be handed the full catalog.
    pub fn filter_tools(&self) -> bool {
        self.filter_tools
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            alpha: DEFAULT_ALPHA,
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_THRESHOLD,
            filter_tools: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetrievalConfigBuilder {
    embedding_model: Option<String>,
    alpha: Option<f64>,
    top_k: Option<usize>,
    threshold: Option<f64>,
    filter_tools: Option<bool>,
}

impl RetrievalConfigBuilder {
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = Some(model.into());
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    pub fn filter_tools(mut self, enabled: bool) -> Self {
        self.filter_tools = Some(enabled);
        self
    }

    /// Validate and build. All violations are reported together.
    pub fn build(self) -> ConfigResult<RetrievalConfig> {
        let defaults = RetrievalConfig::default();
        let config = RetrievalConfig {
            embedding_model: self.embedding_model.unwrap_or(defaults.embedding_model),
            alpha: self.alpha.unwrap_or(defaults.alpha),
            top_k: self.top_k.unwrap_or(defaults.top_k),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            filter_tools: self.filter_tools.unwrap_or(defaults.filter_tools),
        };

        let mut errors = Vec::new();
        if config.embedding_model.trim().is_empty() {
            errors.push(invalid("embedding_model", "must not be empty"));
        }
        if !(0.0..=1.0).contains(&config.alpha) {
            errors.push(invalid(
                "alpha",
                format!("{} is outside [0, 1]", config.alpha),
            ));
        }
        if !(MIN_TOP_K..=MAX_TOP_K).contains(&config.top_k) {
            errors.push(invalid(
                "top_k",
                format!("{} is outside [{MIN_TOP_K}, {MAX_TOP_K}]", config.top_k),
            ));
        }
        if !(0.0..=1.0).contains(&config.threshold) {
            errors.push(invalid(
                "threshold",
                format!("{} is outside [0, 1]", config.threshold),
            ));
        }

        match errors.len() {
            0 => Ok(config),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::ValidationErrors(ValidationErrors(errors))),
        }
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}
