//! Environment variable configuration provider.

use super::provider::ConfigProvider;
use super::{ConfigError, ConfigResult};

/// Prefix used by [`EnvConfigProvider::default`].
pub const DEFAULT_ENV_PREFIX: &str = "TOOLS_RAG_";

/// Provider mapping `top_k` to `TOOLS_RAG_TOP_K`.
#[derive(Debug, Clone)]
pub struct EnvConfigProvider {
    prefix: String,
}

impl EnvConfigProvider {
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn env_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase().replace('.', "_"))
    }
}

impl Default for EnvConfigProvider {
    fn default() -> Self {
        Self::prefixed(DEFAULT_ENV_PREFIX)
    }
}

#[async_trait::async_trait]
impl ConfigProvider for EnvConfigProvider {
    fn name(&self) -> &str {
        "env"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        match std::env::var(self.env_key(key)) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_conversion() {
        let provider = EnvConfigProvider::default();
        assert_eq!(provider.env_key("top_k"), "TOOLS_RAG_TOP_K");
        assert_eq!(provider.env_key("embedding.model"), "TOOLS_RAG_EMBEDDING_MODEL");

        let provider = EnvConfigProvider::prefixed("RAG_");
        assert_eq!(provider.env_key("alpha"), "RAG_ALPHA");
    }

    #[tokio::test]
    async fn test_env_provider_get() {
        let provider = EnvConfigProvider::prefixed("TOOLS_RAG_ENV_TEST_");

        // SAFETY: Test-only environment setup with a unique variable name
        unsafe { std::env::set_var("TOOLS_RAG_ENV_TEST_ALPHA", "0.4") };
        let value = provider.get_raw("alpha").await.unwrap();
        assert_eq!(value, Some("0.4".to_string()));
        unsafe { std::env::remove_var("TOOLS_RAG_ENV_TEST_ALPHA") };
    }

    #[tokio::test]
    async fn test_env_provider_not_found() {
        let provider = EnvConfigProvider::prefixed("NONEXISTENT_PREFIX_");
        assert_eq!(provider.get_raw("some.key").await.unwrap(), None);
    }
}
