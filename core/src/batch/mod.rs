mod orchestrator;
mod state;
mod summary;

pub use orchestrator::{BatchOptions, BatchOrchestrator};
pub use state::{SkipReason, SubjectState};
pub use summary::{BatchSummary, SubjectReport, FAILURE_SUMMARY_FILE};
