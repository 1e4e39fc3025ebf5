use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use apirun_core::api::{
    expand_path, AppConfig, AuthCredential, CollectionSource, CredentialProvider, LocalCollection,
    ObjectStore, ProcessToolRunner, ReportPublisher, StaticCredential, ToolRunner,
};

use crate::auth::LoginCredentialProvider;
use crate::newman::NewmanPlanner;
use crate::registry::PostmanRegistry;
use crate::storage::S3ObjectStore;

pub fn build_collection(cfg: &AppConfig) -> Result<Box<dyn CollectionSource>> {
    match cfg.batch.collection_file.as_deref() {
        Some(file) if !file.trim().is_empty() => {
            Ok(Box::new(LocalCollection::new(expand_path(file))))
        }
        _ => Ok(Box::new(PostmanRegistry::new(
            cfg.registry.base_url.clone(),
            cfg.registry.api_key.clone(),
            cfg.registry.collection_id.clone(),
            cfg.registry.timeout_ms,
        )?)),
    }
}

pub fn build_credential(cfg: &AppConfig) -> Result<Box<dyn CredentialProvider>> {
    match cfg.auth.web_token.as_deref() {
        Some(token) if !token.trim().is_empty() => Ok(Box::new(StaticCredential::new(
            AuthCredential::new(cfg.auth.email.clone(), token),
        ))),
        _ => Ok(Box::new(LoginCredentialProvider::new(
            cfg.auth.base_url.clone(),
            cfg.auth.email.clone(),
            cfg.auth.password.clone(),
            cfg.auth.timeout_ms,
        )?)),
    }
}

pub fn build_runner(cfg: &AppConfig) -> Arc<dyn ToolRunner> {
    let planner = Arc::new(NewmanPlanner::new(&cfg.tool));
    Arc::new(ProcessToolRunner::new(planner, cfg.batch.capture_bytes))
}

/// `None` when publishing is disabled.
pub async fn build_publisher(cfg: &AppConfig) -> Result<Option<ReportPublisher>> {
    if !cfg.publish.enabled {
        return Ok(None);
    }
    let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::connect(&cfg.publish).await?);
    Ok(Some(ReportPublisher::new(
        store,
        &cfg.publish.prefix,
        Duration::from_secs(cfg.publish.expires_secs),
    )))
}

pub fn report_root(cfg: &AppConfig) -> PathBuf {
    expand_path(&cfg.batch.report_root)
}
