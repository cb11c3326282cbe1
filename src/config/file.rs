//! JSON file configuration provider.

use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use super::ConfigResult;
use super::provider::ConfigProvider;

/// Read-only provider backed by a JSON object on disk.
///
/// The file is read on first access and cached until [`reload`](Self::reload).
/// A missing file behaves as an empty configuration. Dotted keys address
/// nested objects (`"retrieval.alpha"`).
pub struct FileConfigProvider {
    path: PathBuf,
    data: RwLock<Option<serde_json::Value>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the file, replacing the cached contents.
    pub async fn reload(&self) -> ConfigResult<()> {
        let loaded = self.load().await?;
        *self.data.write().await = Some(loaded);
        Ok(())
    }

    async fn load(&self) -> ConfigResult<serde_json::Value> {
        if !self.path.exists() {
            return Ok(serde_json::Value::Object(Default::default()));
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait::async_trait]
impl ConfigProvider for FileConfigProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        if self.data.read().await.is_none() {
            self.reload().await?;
        }

        let data = self.data.read().await;
        let Some(root) = data.as_ref() else {
            return Ok(None);
        };

        let found = key
            .split('.')
            .try_fold(root, |node, part| node.get(part));

        Ok(match found {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Null) | None => None,
            Some(value) => Some(value.to_string()),
        })
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .finish()
    }
}
