//! Integration tests for the batch orchestrator
//!
//! These drive whole batches through a scripted in-process runner, so the
//! ordering, isolation and partial-failure rules can be checked without the
//! external test tool.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::watch;

use apirun_core::api::{
    AuthCredential, BatchOptions, BatchOrchestrator, FailureRecord, RunContext, RunDescriptor,
    RunOutcome, RunnerError, SkipReason, Subject, SubjectState, Termination, ToolRunner,
};
use apirun_core::subject::subjects_from_value;

#[derive(Clone, Default)]
struct Script {
    delay_ms: u64,
    exit_code: i32,
    // (request name, message) pairs written to the result artifact
    failures: Vec<(String, String)>,
    panic: bool,
}

struct ScriptedRunner {
    scripts: HashMap<String, Script>,
    completed: Mutex<Vec<String>>,
    running: AtomicUsize,
    peak: AtomicUsize,
    cancel_on_first: Option<watch::Sender<bool>>,
}

impl ScriptedRunner {
    fn new(scripts: Vec<(&str, Script)>) -> Self {
        Self {
            scripts: scripts
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            completed: Mutex::new(vec![]),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            cancel_on_first: None,
        }
    }
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
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(tx) = &self.cancel_on_first {
            let _ = tx.send(true);
        }

        let script = self.scripts.get(&d.subject.name).cloned().unwrap_or_default();
        if script.panic {
            self.running.fetch_sub(1, Ordering::SeqCst);
            panic!("runner blew up for {}", d.subject.name);
        }
        tokio::time::sleep(Duration::from_millis(script.delay_ms)).await;

        if !script.failures.is_empty() {
            std::fs::create_dir_all(&d.run_dir).unwrap();
            let failures: Vec<_> = script
                .failures
                .iter()
                .map(|(req, msg)| json!({"source": {"name": req}, "error": {"message": msg}}))
                .collect();
            std::fs::write(
                &d.result_artifact_path,
                json!({"run": {"failures": failures}}).to_string(),
            )
            .unwrap();
        }

        self.completed.lock().unwrap().push(d.subject.name.clone());
        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(RunOutcome {
            subject: d.subject.name.clone(),
            termination: Termination::Exited(script.exit_code),
            duration_ms: script.delay_ms,
            stdout: String::new(),
            stderr: String::new(),
            stdout_log: d.stdout_log_path.clone(),
            stderr_log: d.stderr_log_path.clone(),
        })
    }
}

fn ctx(root: &Path) -> RunContext {
    RunContext::new(
        "https://api.example.test",
        AuthCredential::new("qa@example.test", "tok"),
        "collection.json",
        root,
    )
}

fn options(max_parallel: usize) -> BatchOptions {
    BatchOptions {
        max_parallel,
        ..BatchOptions::default()
    }
}

fn failing(request: &str, message: &str, delay_ms: u64) -> Script {
    Script {
        delay_ms,
        exit_code: 1,
        failures: vec![(request.to_string(), message.to_string())],
        panic: false,
    }
}

fn subjects(names: &[&str]) -> Vec<Subject> {
    names.iter().map(|n| Subject::new(*n)).collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failures_follow_input_order_when_runs_finish_out_of_order() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new(vec![
        ("A", failing("A req", "A broke", 0)),
        ("B", failing("B req", "B broke", 300)),
        ("C", failing("C req", "C broke", 0)),
    ]));

    let summary = BatchOrchestrator::new(runner.clone(), options(3))
        .run(&subjects(&["A", "B", "C"]), &ctx(dir.path()))
        .await;

    let completed = runner.completed.lock().unwrap().clone();
    assert_eq!(completed.last().map(String::as_str), Some("B"));

    let labels: Vec<&str> = summary
        .failures
        .iter()
        .map(|f| f.request_label.as_str())
        .collect();
    assert_eq!(labels, vec!["A req", "B req", "C req"]);
    let names: Vec<&str> = summary.subjects.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn end_to_end_mixed_batch() {
    let dir = tempfile::tempdir().unwrap();
    let list = json!([
        {"companyName": "Acme & Co"},
        {"companyName": ""},
        {"companyName": "Beta"}
    ]);
    let subjects = subjects_from_value(&list, &["companyName".to_string()]).unwrap();
    let runner = Arc::new(ScriptedRunner::new(vec![
        ("Acme & Co", Script::default()),
        ("Beta", failing("Get invoices", "expected 200 but got 500", 0)),
    ]));

    let summary = BatchOrchestrator::new(runner, options(2))
        .run(&subjects, &ctx(dir.path()))
        .await;

    assert_eq!(summary.total_subjects, 3);
    assert_eq!(summary.skipped_subjects, vec![String::new()]);
    assert_eq!(
        summary.failures,
        vec![FailureRecord::new(
            dir.path().join("Beta").join("result.json").display().to_string(),
            "Get invoices",
            "expected 200 but got 500",
        )]
    );
    assert!(summary.is_failed());
    assert_eq!(summary.subjects[0].state, SubjectState::Passed);
    assert_eq!(summary.subjects[0].token.as_deref(), Some("Acme_Co"));
    assert_eq!(
        summary.subjects[1].state,
        SubjectState::Skipped {
            reason: SkipReason::InvalidName
        }
    );
    assert_eq!(summary.subjects[2].state, SubjectState::Failed);
    assert_eq!(summary.subjects[2].exit_code, Some(1));
}

#[tokio::test]
async fn skipped_plus_executed_always_equals_total() {
    let cases: Vec<Vec<&str>> = vec![
        vec![],
        vec!["", "null"],
        vec!["A", "", "B", "NULL", "C"],
        vec!["Acme & Co", "Acme Co", "acme  co"],
    ];
    for names in cases {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new(vec![("B", failing("r", "m", 0))]));
        let summary = BatchOrchestrator::new(runner, options(2))
            .run(&subjects(&names), &ctx(dir.path()))
            .await;

        assert_eq!(
            summary.skipped_count() + summary.executed_count(),
            summary.total_subjects,
            "{names:?}"
        );
        assert!(summary.subjects.iter().all(|s| s.state.is_terminal()));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallelism_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let slow = Script {
        delay_ms: 50,
        ..Script::default()
    };
    let names = ["s1", "s2", "s3", "s4", "s5", "s6"];
    let runner = Arc::new(ScriptedRunner::new(
        names.iter().map(|n| (*n, slow.clone())).collect(),
    ));

    let summary = BatchOrchestrator::new(runner.clone(), options(2))
        .run(&subjects(&names), &ctx(dir.path()))
        .await;

    assert_eq!(summary.passed_count(), 6);
    assert!(runner.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn timed_out_run_fails_only_that_subject() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new(vec![(
        "Slow",
        Script {
            delay_ms: 5_000,
            ..Script::default()
        },
    )]));
    let opts = BatchOptions {
        max_parallel: 1,
        run_timeout: Duration::from_millis(100),
        ..BatchOptions::default()
    };

    let summary = BatchOrchestrator::new(runner, opts)
        .run(&subjects(&["Slow", "Fast"]), &ctx(dir.path()))
        .await;

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].request_label, "Slow");
    assert_eq!(summary.failures[0].error_message, "run timed out after 100ms");
    assert_eq!(summary.subjects[0].exit_code, Some(124));
    assert_eq!(summary.subjects[1].state, SubjectState::Passed);
}

#[tokio::test]
async fn panicking_run_is_captured_as_failure() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new(vec![(
        "Boom",
        Script {
            panic: true,
            ..Script::default()
        },
    )]));

    let summary = BatchOrchestrator::new(runner, options(2))
        .run(&subjects(&["Boom", "Fine"]), &ctx(dir.path()))
        .await;

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].request_label, "Boom");
    assert!(summary.failures[0].error_message.starts_with("run task aborted"));
    assert_eq!(summary.subjects[1].state, SubjectState::Passed);
}

#[tokio::test]
async fn cancellation_stops_dispatch_but_keeps_finished_results() {
    let dir = tempfile::tempdir().unwrap();
    let (tx, rx) = watch::channel(false);
    let mut runner = ScriptedRunner::new(vec![("First", failing("login", "401", 20))]);
    runner.cancel_on_first = Some(tx);
    let runner = Arc::new(runner);

    let summary = BatchOrchestrator::new(runner.clone(), options(1))
        .with_cancel(rx)
        .run(&subjects(&["First", "Second", "Third"]), &ctx(dir.path()))
        .await;

    assert!(summary.cancelled);
    assert_eq!(*runner.completed.lock().unwrap(), vec!["First".to_string()]);
    assert_eq!(summary.skipped_subjects, vec!["Second", "Third"]);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].request_label, "login");
}

#[tokio::test]
async fn stale_paths_are_isolated_per_subject() {
    let dir = tempfile::tempdir().unwrap();
    let runner = Arc::new(ScriptedRunner::new(vec![
        ("One", failing("a", "x", 0)),
        ("Two", failing("b", "y", 0)),
    ]));
    let summary = BatchOrchestrator::new(runner, options(2))
        .run(&subjects(&["One", "Two"]), &ctx(dir.path()))
        .await;

    let files: Vec<PathBuf> = summary
        .failures
        .iter()
        .map(|f| PathBuf::from(&f.source_file))
        .collect();
    assert_eq!(files[0], dir.path().join("One").join("result.json"));
    assert_eq!(files[1], dir.path().join("Two").join("result.json"));
}
