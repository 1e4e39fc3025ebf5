use std::path::{Path, PathBuf};

use crate::error::RunnerError;
use crate::plan::IterationData;

/// Owns a generated iteration-data file for the duration of one run and
/// removes it when dropped, whether the run passed, failed or was cancelled.
/// Shared files are left alone.
#[derive(Debug)]
pub struct IterationDataGuard {
    owned: Option<PathBuf>,
}

impl IterationDataGuard {
    pub async fn acquire(data: &IterationData, path: &Path) -> Result<Self, RunnerError> {
        match data {
            IterationData::Shared(_) => Ok(Self { owned: None }),
            IterationData::Generated(payload) => {
                let body = serde_json::to_vec(payload).map_err(|e| RunnerError::IterationData {
                    path: path.display().to_string(),
                    source: e,
                })?;
                tokio::fs::write(path, body)
                    .await
                    .map_err(|e| RunnerError::Io {
                        path: path.display().to_string(),
                        source: e,
                    })?;
                Ok(Self {
                    owned: Some(path.to_path_buf()),
                })
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.owned.as_deref()
    }
}

impl Drop for IterationDataGuard {
    fn drop(&mut self) {
        let Some(path) = self.owned.take() else {
            return;
        };
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(
                    target: "apirun.runner",
                    path = %path.display(),
                    error = %e,
                    "failed to remove iteration data file"
                );
            }
        }
    }
}
