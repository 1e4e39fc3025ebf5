//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `apirun_core::api` instead of reaching into internal modules.

pub use crate::auth::{CredentialProvider, StaticCredential};
pub use crate::batch::{
    BatchOptions, BatchOrchestrator, BatchSummary, SkipReason, SubjectReport, SubjectState,
    FAILURE_SUMMARY_FILE,
};
pub use crate::collection::{CollectionSource, LocalCollection, COLLECTION_FILE};
pub use crate::config::{
    AppConfig, AuthInjection, IterationDataSource, PublishConfig, Reporter, ToolConfig,
};
pub use crate::context::{AuthCredential, RunContext};
pub use crate::error::{BatchError, ConfigError, PublishError, RunnerError, SubjectError};
pub use crate::plan::{RunDescriptor, AUTH_TOKEN_VAR, BASE_URL_VAR};
pub use crate::publish::{ObjectStore, PublishOutcome, ReportPublisher, RetrievalLink};
pub use crate::result::FailureRecord;
pub use crate::runner::{
    CommandPlan, CommandPlanner, ProcessToolRunner, RunOutcome, Termination, ToolRunner,
};
pub use crate::subject::{load_subjects, sanitize, Subject};
pub use crate::util::expand_path;
