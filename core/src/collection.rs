use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// File name used when a fetched collection is written into the report root.
pub const COLLECTION_FILE: &str = "collection.json";

/// Where the test collection comes from.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    fn name(&self) -> &str;

    /// Makes the collection available as a local file under `dir` (or
    /// elsewhere) and returns its path.
    async fn materialize(&self, dir: &Path) -> anyhow::Result<PathBuf>;
}

/// A collection file that already exists locally.
pub struct LocalCollection {
    path: PathBuf,
}

impl LocalCollection {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CollectionSource for LocalCollection {
    fn name(&self) -> &str {
        "local"
    }

    async fn materialize(&self, _dir: &Path) -> anyhow::Result<PathBuf> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            anyhow::anyhow!("cannot read collection {}: {e}", self.path.display())
        })?;
        serde_json::from_slice::<serde_json::Value>(&raw).map_err(|e| {
            anyhow::anyhow!("collection {} is not valid JSON: {e}", self.path.display())
        })?;
        Ok(self.path.clone())
    }
}
