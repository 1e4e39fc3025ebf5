use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::PublishError;

/// Minimal object-storage abstraction used for report publishing.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Human readable location, e.g. `s3://bucket`.
    fn location(&self) -> String;

    /// Uploads a local file under `key`.
    async fn put_file(
        &self,
        key: &str,
        path: &Path,
        content_type: Option<&str>,
    ) -> Result<(), PublishError>;

    /// Returns a time-limited GET URL for `key`.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, PublishError>;
}
