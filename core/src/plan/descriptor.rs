use std::collections::HashMap;
use std::path::PathBuf;

use crate::batch::FAILURE_SUMMARY_FILE;
use crate::collection::COLLECTION_FILE;
use crate::config::IterationDataSource;
use crate::context::RunContext;
use crate::error::SubjectError;
use crate::subject::{sanitize, Subject};

use super::iteration::{iteration_payload, IterationData};

const ITERATION_FILE: &str = "iteration_data.json";
const RESULT_FILE: &str = "result.json";
const STDOUT_LOG: &str = "stdout.log";
const STDERR_LOG: &str = "stderr.log";
const ALLURE_DIR: &str = "allure-results";

// Batch-level files written directly under the report root.
const RESERVED_TOKENS: [&str; 2] = [COLLECTION_FILE, FAILURE_SUMMARY_FILE];

/// Isolated execution plan for one subject. All paths live under
/// `<report_root>/<sanitized_name>/`.
#[derive(Debug, Clone)]
pub struct RunDescriptor {
    pub subject: Subject,
    pub sanitized_name: String,
    pub run_dir: PathBuf,
    pub iteration_data_path: PathBuf,
    pub iteration_data: IterationData,
    pub result_artifact_path: PathBuf,
    pub report_artifact_path: PathBuf,
    pub allure_results_path: PathBuf,
    pub stdout_log_path: PathBuf,
    pub stderr_log_path: PathBuf,
    pub report_title: String,
}

/// Builds descriptors for one batch and rejects subjects whose tokens
/// collide with an earlier subject's.
pub struct DescriptorBuilder {
    ctx: RunContext,
    source: IterationDataSource,
    // lowercased token -> name of the subject that claimed it
    claimed: HashMap<String, String>,
}

impl DescriptorBuilder {
    pub fn new(ctx: RunContext, source: IterationDataSource) -> Self {
        Self {
            ctx,
            source,
            claimed: HashMap::new(),
        }
    }

    /// Computes paths only; nothing touches the filesystem.
    pub fn build(&mut self, subject: &Subject) -> Result<RunDescriptor, SubjectError> {
        let token = sanitize(&subject.name)?;

        // Tokens are compared case-insensitively so runs stay apart on
        // case-insensitive filesystems too.
        let key = token.to_lowercase();
        if RESERVED_TOKENS.iter().any(|r| r.eq_ignore_ascii_case(&key)) {
            return Err(SubjectError::ReservedName { token });
        }
        if let Some(existing) = self.claimed.get(&key) {
            return Err(SubjectError::DuplicateSanitizedName {
                token,
                existing: existing.clone(),
            });
        }
        self.claimed.insert(key, subject.name.clone());

        let run_dir = self.ctx.report_root().join(&token);
        let (iteration_data_path, iteration_data) = match &self.source {
            IterationDataSource::PerSubject => (
                run_dir.join(ITERATION_FILE),
                IterationData::Generated(iteration_payload(subject, &self.ctx)),
            ),
            IterationDataSource::Shared { shared_file } => {
                let path = PathBuf::from(shared_file);
                (path.clone(), IterationData::Shared(path))
            }
        };

        Ok(RunDescriptor {
            subject: subject.clone(),
            iteration_data_path,
            iteration_data,
            result_artifact_path: run_dir.join(RESULT_FILE),
            report_artifact_path: run_dir.join(format!("{token}.html")),
            allure_results_path: run_dir.join(ALLURE_DIR),
            stdout_log_path: run_dir.join(STDOUT_LOG),
            stderr_log_path: run_dir.join(STDERR_LOG),
            report_title: subject.name.trim().to_string(),
            sanitized_name: token,
            run_dir,
        })
    }
}
