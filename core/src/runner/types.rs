use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use super::exit::TIMEOUT_EXIT_CODE;

/// Program and arguments for one run, produced by a [`super::CommandPlanner`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandPlan {
    pub program: String,
    pub args: Vec<String>,
    pub envs: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    TimedOut { after: Duration },
}

/// What one invocation of the test tool produced. Exit status is data here,
/// never an error.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub subject: String,
    pub termination: Termination,
    pub duration_ms: u64,
    /// Last `capture_bytes` of the run's stdout.
    pub stdout: String,
    /// Last `capture_bytes` of the run's stderr.
    pub stderr: String,
    pub stdout_log: PathBuf,
    pub stderr_log: PathBuf,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self.termination {
            Termination::Exited(code) => code,
            Termination::TimedOut { .. } => TIMEOUT_EXIT_CODE,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code() == 0
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.termination, Termination::TimedOut { .. })
    }
}
