use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::PublishError;

use super::store::ObjectStore;

pub const KEY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalLink {
    pub key: String,
    pub url: String,
    pub expires_in: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Published(RetrievalLink),
    /// Nothing to publish; not an error.
    Skipped { path: PathBuf, reason: String },
}

/// Uploads report artifacts and hands back time-limited links.
///
/// Publishing is best-effort: callers log errors and carry on.
pub struct ReportPublisher {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    expires_in: Duration,
}

impl ReportPublisher {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: &str, expires_in: Duration) -> Self {
        Self {
            store,
            prefix: prefix.trim().trim_matches('/').to_string(),
            expires_in,
        }
    }

    pub async fn publish(&self, local: &Path) -> Result<PublishOutcome, PublishError> {
        self.publish_at(local, Utc::now()).await
    }

    pub async fn publish_at(
        &self,
        local: &Path,
        now: DateTime<Utc>,
    ) -> Result<PublishOutcome, PublishError> {
        if !local.is_file() {
            tracing::info!(
                target: "apirun.publish",
                path = %local.display(),
                "artifact not found, skipping upload"
            );
            return Ok(PublishOutcome::Skipped {
                path: local.to_path_buf(),
                reason: "artifact not found".to_string(),
            });
        }

        let key = object_key(&self.prefix, local, now)?;
        self.store
            .put_file(&key, local, content_type(local))
            .await?;
        tracing::info!(
            target: "apirun.publish",
            location = %self.store.location(),
            key = %key,
            "artifact uploaded"
        );

        let url = self.store.presign_get(&key, self.expires_in).await?;
        Ok(PublishOutcome::Published(RetrievalLink {
            key,
            url,
            expires_in: self.expires_in,
        }))
    }
}

/// `<prefix>/<stem>_<timestamp>.<ext>`; the prefix is omitted when empty.
pub fn object_key(prefix: &str, local: &Path, now: DateTime<Utc>) -> Result<String, PublishError> {
    let stem = local
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            PublishError::Invalid(format!("no usable file name in {}", local.display()))
        })?;
    let stamp = now.format(KEY_TIMESTAMP_FORMAT);
    let name = match local.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_{stamp}.{ext}"),
        None => format!("{stem}_{stamp}"),
    };
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        Ok(name)
    } else {
        Ok(format!("{prefix}/{name}"))
    }
}

fn content_type(path: &Path) -> Option<&'static str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => Some("text/html"),
        Some("json") => Some("application/json"),
        Some("xml") => Some("application/xml"),
        _ => None,
    }
}
