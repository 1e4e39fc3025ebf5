use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::result::FailureRecord;

use super::state::SubjectState;

pub const FAILURE_SUMMARY_FILE: &str = "failure_summary.json";

#[derive(Debug, Clone, Serialize)]
pub struct SubjectReport {
    pub name: String,
    pub token: Option<String>,
    #[serde(flatten)]
    pub state: SubjectState,
    pub exit_code: Option<i32>,
    pub duration_ms: Option<u64>,
    pub failure_count: usize,
    pub report_artifact: Option<PathBuf>,
}

/// Outcome of a whole batch. Subject reports and failures follow the input
/// order of the subject list, not completion order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub batch_id: String,
    pub total_subjects: usize,
    pub skipped_subjects: Vec<String>,
    pub failures: Vec<FailureRecord>,
    pub subjects: Vec<SubjectReport>,
    pub cancelled: bool,
}

impl BatchSummary {
    pub fn executed_count(&self) -> usize {
        self.subjects.iter().filter(|s| s.state.is_executed()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_subjects.len()
    }

    pub fn passed_count(&self) -> usize {
        self.subjects
            .iter()
            .filter(|s| s.state == SubjectState::Passed)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.subjects
            .iter()
            .filter(|s| s.state == SubjectState::Failed)
            .count()
    }

    /// Skipped subjects alone do not fail a batch.
    pub fn is_failed(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Writes the failures as pretty JSON. Nothing is written when there are
    /// none; returns whether the file was written.
    pub fn write_failure_summary(&self, path: &Path) -> std::io::Result<bool> {
        if self.failures.is_empty() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(&self.failures)?;
        std::fs::write(path, body)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SkipReason;

    fn summary(failures: Vec<FailureRecord>) -> BatchSummary {
        BatchSummary {
            batch_id: "b".into(),
            total_subjects: 2,
            skipped_subjects: vec!["".into()],
            failures,
            subjects: vec![
                SubjectReport {
                    name: "".into(),
                    token: None,
                    state: SubjectState::Skipped {
                        reason: SkipReason::InvalidName,
                    },
                    exit_code: None,
                    duration_ms: None,
                    failure_count: 0,
                    report_artifact: None,
                },
                SubjectReport {
                    name: "Acme".into(),
                    token: Some("Acme".into()),
                    state: SubjectState::Passed,
                    exit_code: Some(0),
                    duration_ms: Some(12),
                    failure_count: 0,
                    report_artifact: None,
                },
            ],
            cancelled: false,
        }
    }

    #[test]
    fn empty_failures_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FAILURE_SUMMARY_FILE);
        let s = summary(vec![]);

        assert!(!s.is_failed());
        assert!(!s.write_failure_summary(&path).unwrap());
        assert!(!path.exists());
        assert_eq!(s.executed_count() + s.skipped_count(), s.total_subjects);
    }

    #[test]
    fn failures_are_written_as_pretty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FAILURE_SUMMARY_FILE);
        let s = summary(vec![FailureRecord::new("r.json", "Login", "401")]);

        assert!(s.is_failed());
        assert!(s.write_failure_summary(&path).unwrap());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains('\n'));
        let back: Vec<FailureRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, s.failures);
    }

    #[test]
    fn subject_report_flattens_state() {
        let s = summary(vec![]);
        let v = serde_json::to_value(&s.subjects[0]).unwrap();
        assert_eq!(v["state"], "skipped");
        assert_eq!(v["reason"], "invalid_name");
    }
}
