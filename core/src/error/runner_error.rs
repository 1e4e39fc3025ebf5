// core/src/error/runner_error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("test tool not found: {program}")]
    ToolNotFound { program: String },

    #[error("failed to spawn process {program}: {source}")]
    Spawn { program: String, #[source] source: std::io::Error },

    #[error("io error on {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("failed to write iteration data to {path}: {source}")]
    IterationData { path: String, #[source] source: serde_json::Error },
}
