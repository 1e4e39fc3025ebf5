use std::io::SeekFrom;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::process::Command;

use crate::context::RunContext;
use crate::error::RunnerError;
use crate::plan::RunDescriptor;

use super::exit::normalize_exit;
use super::guard::IterationDataGuard;
use super::traits::{CommandPlanner, ToolRunner};
use super::types::{CommandPlan, RunOutcome, Termination};

pub struct ProcessSpec<'a> {
    pub plan: &'a CommandPlan,
    pub stdout_log: &'a Path,
    pub stderr_log: &'a Path,
    pub capture_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub termination: Termination,
    pub duration_ms: u64,
    pub stdout_tail: String,
    pub stderr_tail: String,
}

/// Runs one child process with stdout/stderr redirected into log files.
///
/// Non-zero exits are returned as data; only a failure to start (or to wait
/// on) the child is an error. Dropping the returned future kills the child,
/// which is how callers enforce a time budget.
pub async fn run_process(spec: &ProcessSpec<'_>) -> Result<ProcessOutput, RunnerError> {
    let program = spec.plan.program.clone();
    let stdout = create_log(spec.stdout_log)?;
    let stderr = create_log(spec.stderr_log)?;

    let mut cmd = Command::new(&program);
    cmd.args(&spec.plan.args)
        .envs(&spec.plan.envs)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);

    let started = Instant::now();
    let mut child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RunnerError::ToolNotFound {
                program: program.clone(),
            }
        } else {
            RunnerError::Spawn {
                program: program.clone(),
                source: e,
            }
        }
    })?;

    let status = child.wait().await.map_err(|e| RunnerError::Io {
        path: program.clone(),
        source: e,
    })?;
    let termination = Termination::Exited(normalize_exit(status));
    let duration_ms = started.elapsed().as_millis() as u64;

    Ok(ProcessOutput {
        termination,
        duration_ms,
        stdout_tail: read_tail(spec.stdout_log, spec.capture_bytes).await?,
        stderr_tail: read_tail(spec.stderr_log, spec.capture_bytes).await?,
    })
}

fn create_log(path: &Path) -> Result<std::fs::File, RunnerError> {
    std::fs::File::create(path).map_err(|e| RunnerError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

async fn read_tail(path: &Path, capture_bytes: usize) -> Result<String, RunnerError> {
    let io_err = |e| RunnerError::Io {
        path: path.display().to_string(),
        source: e,
    };
    let mut file = tokio::fs::File::open(path).await.map_err(io_err)?;
    let len = file.metadata().await.map_err(io_err)?.len();
    let start = len.saturating_sub(capture_bytes as u64);
    file.seek(SeekFrom::Start(start)).await.map_err(io_err)?;

    let mut buf = Vec::with_capacity((len - start) as usize);
    file.read_to_end(&mut buf).await.map_err(io_err)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn remove_stale_file(path: &Path) -> Result<(), RunnerError> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(RunnerError::Io {
            path: path.display().to_string(),
            source: e,
        }),
        _ => Ok(()),
    }
}

async fn remove_stale_dir(path: &Path) -> Result<(), RunnerError> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(RunnerError::Io {
            path: path.display().to_string(),
            source: e,
        }),
        _ => Ok(()),
    }
}

/// [`ToolRunner`] that drives an external command planned by a
/// [`CommandPlanner`].
pub struct ProcessToolRunner {
    planner: Arc<dyn CommandPlanner>,
    capture_bytes: usize,
}

impl ProcessToolRunner {
    pub fn new(planner: Arc<dyn CommandPlanner>, capture_bytes: usize) -> Self {
        Self {
            planner,
            capture_bytes,
        }
    }
}

#[async_trait]
impl ToolRunner for ProcessToolRunner {
    fn name(&self) -> &str {
        self.planner.name()
    }

    async fn execute(
        &self,
        descriptor: &RunDescriptor,
        ctx: &RunContext,
    ) -> Result<RunOutcome, RunnerError> {
        let run_dir = &descriptor.run_dir;
        tokio::fs::create_dir_all(run_dir)
            .await
            .map_err(|e| RunnerError::Io {
                path: run_dir.display().to_string(),
                source: e,
            })?;

        // Artifacts left over from an earlier batch must not be parsed or
        // published as this run's output.
        remove_stale_file(&descriptor.result_artifact_path).await?;
        remove_stale_file(&descriptor.report_artifact_path).await?;
        remove_stale_dir(&descriptor.allure_results_path).await?;

        let _iteration =
            IterationDataGuard::acquire(&descriptor.iteration_data, &descriptor.iteration_data_path)
                .await?;

        let plan = self.planner.plan(descriptor, ctx);
        tracing::debug!(
            target: "apirun.runner",
            subject = %descriptor.subject.name,
            program = %plan.program,
            args = ?plan.args,
            "starting run"
        );

        let out = run_process(&ProcessSpec {
            plan: &plan,
            stdout_log: &descriptor.stdout_log_path,
            stderr_log: &descriptor.stderr_log_path,
            capture_bytes: self.capture_bytes,
        })
        .await?;

        Ok(RunOutcome {
            subject: descriptor.subject.name.clone(),
            termination: out.termination,
            duration_ms: out.duration_ms,
            stdout: out.stdout_tail,
            stderr: out.stderr_tail,
            stdout_log: descriptor.stdout_log_path.clone(),
            stderr_log: descriptor.stderr_log_path.clone(),
        })
    }
}
