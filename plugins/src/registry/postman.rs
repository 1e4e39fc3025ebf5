use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use apirun_core::api::{CollectionSource, COLLECTION_FILE};

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Deserialize)]
struct CollectionEnvelope {
    collection: Option<Value>,
}

/// Fetches a collection from the Postman API once per batch and writes it
/// next to the reports.
pub struct PostmanRegistry {
    client: Client,
    base_url: String,
    api_key: String,
    collection_id: String,
}

impl PostmanRegistry {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        collection_id: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("building registry http client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            collection_id: collection_id.into(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection_id)
    }
}

#[async_trait]
impl CollectionSource for PostmanRegistry {
    fn name(&self) -> &str {
        "postman"
    }

    async fn materialize(&self, dir: &Path) -> Result<PathBuf> {
        let url = self.collection_url();
        tracing::info!(target: "apirun.batch", collection_id = %self.collection_id, "fetching collection");

        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!(
                "collection fetch failed with {status}: {}",
                body.chars().take(200).collect::<String>()
            );
        }

        let envelope: CollectionEnvelope = resp
            .json()
            .await
            .context("collection response is not valid JSON")?;
        let collection = envelope
            .collection
            .ok_or_else(|| anyhow!("collection response has no `collection` field"))?;

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("creating {}", dir.display()))?;
        let path = dir.join(COLLECTION_FILE);
        tokio::fs::write(&path, serde_json::to_vec_pretty(&collection)?)
            .await
            .with_context(|| format!("writing {}", path.display()))?;

        tracing::info!(target: "apirun.batch", path = %path.display(), "collection saved");
        Ok(path)
    }
}
