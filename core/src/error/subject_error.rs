// core/src/error/subject_error.rs
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubjectError {
    #[error("invalid subject name: {name:?}")]
    InvalidSubjectName { name: String },

    #[error("sanitized name '{token}' collides with subject '{existing}'")]
    DuplicateSanitizedName { token: String, existing: String },

    #[error("sanitized name '{token}' is reserved for a batch-level file")]
    ReservedName { token: String },
}
