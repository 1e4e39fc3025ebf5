use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InvalidName,
    DuplicateName,
    Cancelled,
}

/// Lifecycle of one subject within a batch:
/// `Pending -> Skipped` or `Pending -> Running -> Passed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SubjectState {
    Pending,
    Skipped { reason: SkipReason },
    Running,
    Passed,
    Failed,
}

impl SubjectState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SubjectState::Skipped { .. } | SubjectState::Passed | SubjectState::Failed
        )
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, SubjectState::Passed | SubjectState::Failed)
    }

    pub fn can_advance_to(&self, next: &SubjectState) -> bool {
        matches!(
            (self, next),
            (SubjectState::Pending, SubjectState::Skipped { .. })
                | (SubjectState::Pending, SubjectState::Running)
                | (SubjectState::Running, SubjectState::Passed)
                | (SubjectState::Running, SubjectState::Failed)
        )
    }
}
