// core/src/error/publish_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("presign of {key} failed: {message}")]
    Presign { key: String, message: String },

    #[error("io error on {path}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("invalid publish request: {0}")]
    Invalid(String),
}
