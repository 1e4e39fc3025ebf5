use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinError;
use uuid::Uuid;

use crate::config::{BatchConfig, IterationDataSource, ToolConfig};
use crate::context::RunContext;
use crate::error::SubjectError;
use crate::plan::{DescriptorBuilder, RunDescriptor};
use crate::result::{self, FailureRecord};
use crate::runner::{RunOutcome, Termination, ToolRunner};
use crate::subject::Subject;

use super::state::{SkipReason, SubjectState};
use super::summary::{BatchSummary, SubjectReport};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub max_parallel: usize,
    pub run_timeout: Duration,
    pub iteration_data: IterationDataSource,
}

impl BatchOptions {
    pub fn from_config(batch: &BatchConfig, tool: &ToolConfig) -> Self {
        Self {
            max_parallel: batch.max_parallel.max(1),
            run_timeout: Duration::from_secs(batch.run_timeout_secs),
            iteration_data: tool.iteration_data.clone(),
        }
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_parallel: 1,
            run_timeout: Duration::from_secs(600),
            iteration_data: IterationDataSource::PerSubject,
        }
    }
}

/// Result of one dispatched run, produced inside the run's task.
struct RunResult {
    exit_code: Option<i32>,
    duration_ms: u64,
    failures: Vec<FailureRecord>,
}

/// Per-subject slot, indexed by input position.
struct Slot {
    name: String,
    token: Option<String>,
    state: SubjectState,
    exit_code: Option<i32>,
    duration_ms: Option<u64>,
    failures: Vec<FailureRecord>,
    descriptor: Option<RunDescriptor>,
}

impl Slot {
    fn advance(&mut self, next: SubjectState) {
        debug_assert!(
            self.state.can_advance_to(&next),
            "illegal transition {:?} -> {:?} for {}",
            self.state,
            next,
            self.name
        );
        self.state = next;
    }
}

/// Runs one collection against every subject, at most `max_parallel` at a
/// time, and folds the outcomes into a [`BatchSummary`].
///
/// No single subject can abort the batch: invalid names are skipped, and
/// runner errors, timeouts and panics become failure records.
pub struct BatchOrchestrator {
    runner: Arc<dyn ToolRunner>,
    options: BatchOptions,
    cancel: Option<watch::Receiver<bool>>,
}

impl BatchOrchestrator {
    pub fn new(runner: Arc<dyn ToolRunner>, options: BatchOptions) -> Self {
        Self {
            runner,
            options,
            cancel: None,
        }
    }

    /// Once the receiver reads `true`, no further runs are dispatched.
    /// Runs already in flight finish (bounded by the run timeout).
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub async fn run(&self, subjects: &[Subject], ctx: &RunContext) -> BatchSummary {
        let batch_id = Uuid::new_v4().to_string();
        let batch_started = Instant::now();
        tracing::info!(
            target: "apirun.batch",
            batch_id = %batch_id,
            subjects = subjects.len(),
            max_parallel = self.options.max_parallel,
            runner = self.runner.name(),
            "batch started"
        );

        let mut builder = DescriptorBuilder::new(ctx.clone(), self.options.iteration_data.clone());
        let mut slots: Vec<Slot> = Vec::with_capacity(subjects.len());
        let mut queue: VecDeque<usize> = VecDeque::new();

        for (idx, subject) in subjects.iter().enumerate() {
            let mut slot = Slot {
                name: subject.name.clone(),
                token: None,
                state: SubjectState::Pending,
                exit_code: None,
                duration_ms: None,
                failures: vec![],
                descriptor: None,
            };
            match builder.build(subject) {
                Ok(d) => {
                    slot.token = Some(d.sanitized_name.clone());
                    slot.descriptor = Some(d);
                    queue.push_back(idx);
                }
                Err(err @ SubjectError::InvalidSubjectName { .. }) => {
                    tracing::warn!(target: "apirun.batch", subject = ?subject.name, error = %err, "skipping subject");
                    slot.advance(SubjectState::Skipped {
                        reason: SkipReason::InvalidName,
                    });
                }
                Err(
                    err @ (SubjectError::DuplicateSanitizedName { .. }
                    | SubjectError::ReservedName { .. }),
                ) => {
                    tracing::error!(target: "apirun.batch", subject = ?subject.name, error = %err, "skipping subject");
                    slot.failures.push(FailureRecord::new(
                        ctx.report_root().display().to_string(),
                        subject.name.clone(),
                        err.to_string(),
                    ));
                    slot.advance(SubjectState::Skipped {
                        reason: SkipReason::DuplicateName,
                    });
                }
            }
            slots.push(slot);
        }

        let mut cancel = self.cancel.clone();
        let mut cancelled = is_cancelled(&cancel);
        let mut in_flight = FuturesUnordered::new();

        loop {
            while !cancelled && in_flight.len() < self.options.max_parallel {
                let Some(idx) = queue.pop_front() else {
                    break;
                };
                let slot = &mut slots[idx];
                let Some(descriptor) = slot.descriptor.clone() else {
                    continue;
                };
                slot.advance(SubjectState::Running);
                tracing::info!(
                    target: "apirun.batch",
                    subject = %slot.name,
                    token = %descriptor.sanitized_name,
                    "run dispatched"
                );

                let handle = tokio::spawn(run_one(
                    self.runner.clone(),
                    ctx.clone(),
                    descriptor,
                    self.options.run_timeout,
                ));
                in_flight.push(async move { (idx, handle.await) });
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                Some((idx, joined)) = in_flight.next() => {
                    record_result(&mut slots[idx], joined);
                }
                _ = wait_cancelled(&mut cancel), if !cancelled => {
                    cancelled = true;
                    tracing::warn!(
                        target: "apirun.batch",
                        in_flight = in_flight.len(),
                        not_started = queue.len(),
                        "cancellation requested, no further runs will be dispatched"
                    );
                }
                else => break,
            }
        }

        for idx in queue.drain(..) {
            slots[idx].advance(SubjectState::Skipped {
                reason: SkipReason::Cancelled,
            });
        }

        let summary = fold_summary(batch_id, slots, cancelled);
        tracing::info!(
            target: "apirun.batch",
            batch_id = %summary.batch_id,
            total = summary.total_subjects,
            passed = summary.passed_count(),
            failed = summary.failed_count(),
            skipped = summary.skipped_count(),
            failures = summary.failures.len(),
            duration_ms = batch_started.elapsed().as_millis() as u64,
            "batch finished"
        );
        summary
    }
}

async fn run_one(
    runner: Arc<dyn ToolRunner>,
    ctx: RunContext,
    descriptor: RunDescriptor,
    timeout: Duration,
) -> RunResult {
    let started = Instant::now();
    let outcome = match tokio::time::timeout(timeout, runner.execute(&descriptor, &ctx)).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            tracing::error!(
                target: "apirun.batch",
                subject = %descriptor.subject.name,
                error = %err,
                "run could not be started"
            );
            return RunResult {
                exit_code: None,
                duration_ms: started.elapsed().as_millis() as u64,
                failures: vec![result::runner_error_record(&descriptor, &err)],
            };
        }
        // The execute future was dropped, which kills the child process and
        // removes the iteration data file.
        Err(_) => RunOutcome {
            subject: descriptor.subject.name.clone(),
            termination: Termination::TimedOut { after: timeout },
            duration_ms: started.elapsed().as_millis() as u64,
            stdout: String::new(),
            stderr: String::new(),
            stdout_log: descriptor.stdout_log_path.clone(),
            stderr_log: descriptor.stderr_log_path.clone(),
        },
    };

    let failures = result::parse(&outcome, &descriptor).await;
    RunResult {
        exit_code: Some(outcome.exit_code()),
        duration_ms: outcome.duration_ms,
        failures,
    }
}

fn record_result(slot: &mut Slot, joined: Result<RunResult, JoinError>) {
    let res = match joined {
        Ok(res) => res,
        Err(err) => {
            let source_file = slot
                .descriptor
                .as_ref()
                .map(|d| d.result_artifact_path.display().to_string())
                .unwrap_or_default();
            RunResult {
                exit_code: None,
                duration_ms: 0,
                failures: vec![FailureRecord::new(
                    source_file,
                    slot.name.clone(),
                    format!("run task aborted: {err}"),
                )],
            }
        }
    };

    let passed = res.exit_code == Some(0) && res.failures.is_empty();
    if passed {
        tracing::info!(
            target: "apirun.batch",
            subject = %slot.name,
            duration_ms = res.duration_ms,
            "PASSED"
        );
        slot.advance(SubjectState::Passed);
    } else {
        tracing::warn!(
            target: "apirun.batch",
            subject = %slot.name,
            exit_code = ?res.exit_code,
            failures = res.failures.len(),
            duration_ms = res.duration_ms,
            "FAILED"
        );
        slot.advance(SubjectState::Failed);
    }
    slot.exit_code = res.exit_code;
    slot.duration_ms = Some(res.duration_ms);
    slot.failures = res.failures;
}

fn fold_summary(batch_id: String, slots: Vec<Slot>, cancelled: bool) -> BatchSummary {
    let total_subjects = slots.len();
    let mut skipped_subjects = Vec::new();
    let mut failures = Vec::new();
    let mut subjects = Vec::with_capacity(total_subjects);

    for slot in slots {
        debug_assert!(slot.state.is_terminal(), "{} not terminal", slot.name);
        if matches!(slot.state, SubjectState::Skipped { .. }) {
            skipped_subjects.push(slot.name.clone());
        }
        subjects.push(SubjectReport {
            name: slot.name,
            token: slot.token,
            state: slot.state,
            exit_code: slot.exit_code,
            duration_ms: slot.duration_ms,
            failure_count: slot.failures.len(),
            report_artifact: slot
                .descriptor
                .filter(|_| slot.state.is_executed())
                .map(|d| d.report_artifact_path),
        });
        failures.extend(slot.failures);
    }

    BatchSummary {
        batch_id,
        total_subjects,
        skipped_subjects,
        failures,
        subjects,
        cancelled,
    }
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().is_some_and(|rx| *rx.borrow())
}

/// Resolves once cancellation is requested; never resolves without a
/// receiver or after the sender is gone.
async fn wait_cancelled(cancel: &mut Option<watch::Receiver<bool>>) {
    let Some(rx) = cancel.as_mut() else {
        return std::future::pending().await;
    };
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return std::future::pending().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::context::AuthCredential;
    use crate::error::RunnerError;

    /// Runner that returns a fixed exit code per subject and records calls.
    struct ScriptedRunner {
        codes: HashMap<String, i32>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ToolRunner for ScriptedRunner {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn execute(
            &self,
            d: &RunDescriptor,
            _ctx: &RunContext,
        ) -> Result<RunOutcome, RunnerError> {
            self.calls.lock().unwrap().push(d.subject.name.clone());
            let code = self.codes.get(&d.subject.name).copied().unwrap_or(0);
            if code == -1 {
                return Err(RunnerError::ToolNotFound {
                    program: "newman".into(),
                });
            }
            Ok(RunOutcome {
                subject: d.subject.name.clone(),
                termination: Termination::Exited(code),
                duration_ms: 1,
                stdout: String::new(),
                stderr: String::new(),
                stdout_log: PathBuf::new(),
                stderr_log: PathBuf::new(),
            })
        }
    }

    fn ctx(root: &std::path::Path) -> RunContext {
        RunContext::new(
            "https://api.example.test",
            AuthCredential::new("qa@example.test", "tok"),
            "collection.json",
            root,
        )
    }

    fn runner(codes: &[(&str, i32)]) -> Arc<ScriptedRunner> {
        Arc::new(ScriptedRunner {
            codes: codes.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            calls: Mutex::new(vec![]),
        })
    }

    #[tokio::test]
    async fn invalid_names_are_never_dispatched() {
        let dir = tempfile::tempdir().unwrap();
        let r = runner(&[]);
        let subjects: Vec<Subject> = ["", "   ", "null", "NuLL", "Acme"]
            .into_iter()
            .map(Subject::new)
            .collect();

        let summary = BatchOrchestrator::new(r.clone(), BatchOptions::default())
            .run(&subjects, &ctx(dir.path()))
            .await;

        assert_eq!(*r.calls.lock().unwrap(), vec!["Acme".to_string()]);
        assert_eq!(summary.skipped_subjects, vec!["", "   ", "null", "NuLL"]);
        assert_eq!(summary.executed_count() + summary.skipped_count(), 5);
        assert!(!summary.is_failed());
    }

    #[tokio::test]
    async fn runner_errors_become_synthetic_failures() {
        let dir = tempfile::tempdir().unwrap();
        let r = runner(&[("Acme", -1)]);
        let summary = BatchOrchestrator::new(r, BatchOptions::default())
            .run(&[Subject::new("Acme"), Subject::new("Beta")], &ctx(dir.path()))
            .await;

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].request_label, "Acme");
        assert!(summary.failures[0]
            .error_message
            .starts_with(result::MISSING_ARTIFACT_MESSAGE));
        assert_eq!(summary.subjects[0].state, SubjectState::Failed);
        assert_eq!(summary.subjects[1].state, SubjectState::Passed);
    }

    #[tokio::test]
    async fn duplicate_tokens_are_skipped_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let r = runner(&[]);
        let summary = BatchOrchestrator::new(r.clone(), BatchOptions::default())
            .run(
                &[Subject::new("Acme & Co"), Subject::new("Acme Co")],
                &ctx(dir.path()),
            )
            .await;

        assert_eq!(*r.calls.lock().unwrap(), vec!["Acme & Co".to_string()]);
        assert_eq!(summary.skipped_subjects, vec!["Acme Co"]);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].request_label, "Acme Co");
        assert_eq!(
            summary.subjects[1].state,
            SubjectState::Skipped {
                reason: SkipReason::DuplicateName
            }
        );
    }

    #[tokio::test]
    async fn pre_cancelled_batch_dispatches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let r = runner(&[]);
        let (_tx, rx) = watch::channel(true);
        let summary = BatchOrchestrator::new(r.clone(), BatchOptions::default())
            .with_cancel(rx)
            .run(&[Subject::new("Acme"), Subject::new("Beta")], &ctx(dir.path()))
            .await;

        assert!(r.calls.lock().unwrap().is_empty());
        assert!(summary.cancelled);
        assert_eq!(summary.skipped_subjects, vec!["Acme", "Beta"]);
        assert!(summary.subjects.iter().all(|s| s.state
            == SubjectState::Skipped {
                reason: SkipReason::Cancelled
            }));
    }

    #[tokio::test]
    async fn empty_subject_list_yields_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let summary = BatchOrchestrator::new(runner(&[]), BatchOptions::default())
            .run(&[], &ctx(dir.path()))
            .await;
        assert_eq!(summary.total_subjects, 0);
        assert!(summary.failures.is_empty());
        assert!(!summary.cancelled);
    }
}
