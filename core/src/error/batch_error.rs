// core/src/error/batch_error.rs
use thiserror::Error;

/// Errors that stop a batch before any subject runs.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("config error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("subject list {path} unusable: {reason}")]
    SubjectList { path: String, reason: String },

    #[error("collection fetch failed")]
    Collection(#[source] anyhow::Error),

    #[error("auth exchange failed")]
    Auth(#[source] anyhow::Error),

    #[error("io error on {path}")]
    Io { path: String, #[source] source: std::io::Error },
}
