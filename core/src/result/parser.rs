use crate::error::RunnerError;
use crate::plan::RunDescriptor;
use crate::runner::{RunOutcome, Termination};

use super::model::{FailureRecord, ResultArtifact};

pub const UNKNOWN_REQUEST: &str = "Unknown request";
pub const UNKNOWN_ERROR: &str = "Unknown error";
pub const MISSING_ARTIFACT_MESSAGE: &str = "run failed and no result artifact was generated";

/// Turns a finished run into failure records.
///
/// Exit status 0 yields nothing, whatever the artifact says. A missing or
/// undecodable artifact after a failed run yields exactly one synthetic
/// record labelled with the subject name.
pub async fn parse(outcome: &RunOutcome, descriptor: &RunDescriptor) -> Vec<FailureRecord> {
    let source_file = descriptor.result_artifact_path.display().to_string();
    let subject = descriptor.subject.name.clone();

    match outcome.termination {
        Termination::Exited(0) => return vec![],
        Termination::TimedOut { after } => {
            return vec![FailureRecord::new(
                source_file,
                subject,
                format!("run timed out after {after:?}"),
            )];
        }
        Termination::Exited(_) => {}
    }

    let bytes = match tokio::fs::read(&descriptor.result_artifact_path).await {
        Ok(b) => b,
        Err(e) => {
            tracing::debug!(
                target: "apirun.batch",
                subject = %subject,
                path = %source_file,
                error = %e,
                "result artifact unreadable"
            );
            return vec![FailureRecord::new(source_file, subject, MISSING_ARTIFACT_MESSAGE)];
        }
    };

    match decode_failures(&bytes, &source_file) {
        Some(records) if records.is_empty() => vec![FailureRecord::new(
            source_file,
            subject,
            format!(
                "run exited with code {} but reported no failures",
                outcome.exit_code()
            ),
        )],
        Some(records) => records,
        None => {
            tracing::warn!(
                target: "apirun.batch",
                subject = %subject,
                path = %source_file,
                "result artifact is malformed"
            );
            vec![FailureRecord::new(source_file, subject, MISSING_ARTIFACT_MESSAGE)]
        }
    }
}

/// Decodes the failure list of a result artifact. `None` when the bytes are
/// not a result artifact at all.
pub fn decode_failures(bytes: &[u8], source_file: &str) -> Option<Vec<FailureRecord>> {
    let artifact: ResultArtifact = serde_json::from_slice(bytes).ok()?;
    Some(
        artifact
            .run
            .failures
            .into_iter()
            .map(|f| {
                let request = f
                    .source
                    .and_then(|s| s.name)
                    .unwrap_or_else(|| UNKNOWN_REQUEST.to_string());
                let error = f
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                FailureRecord::new(source_file, request, error)
            })
            .collect(),
    )
}

/// Record for a subject whose run could not be started.
pub fn runner_error_record(descriptor: &RunDescriptor, err: &RunnerError) -> FailureRecord {
    FailureRecord::new(
        descriptor.result_artifact_path.display().to_string(),
        descriptor.subject.name.clone(),
        format!("{MISSING_ARTIFACT_MESSAGE}: {err}"),
    )
}
