use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::watch;

use apirun_core::api::{
    expand_path, load_subjects, AppConfig, BatchError, BatchOptions, BatchOrchestrator,
    BatchSummary, PublishOutcome, ReportPublisher, RunContext, FAILURE_SUMMARY_FILE,
};
use apirun_core::config;
use apirun_plugins::factory;

use crate::commands::cli::Args;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURES: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

pub async fn run_app(args: Args) -> Result<i32> {
    let mut cfg = match args.config.as_deref() {
        Some(path) => config::load_from_path(&expand_path(path))?,
        None => config::load_default()?,
    };
    args.apply(&mut cfg);
    config::validate(&cfg).map_err(BatchError::from)?;

    let _log_guard = crate::logging::init(&cfg)?;

    let report_root = factory::report_root(&cfg);
    tokio::fs::create_dir_all(&report_root)
        .await
        .map_err(|e| BatchError::Io {
            path: report_root.display().to_string(),
            source: e,
        })?;

    let collection = factory::build_collection(&cfg)?
        .materialize(&report_root)
        .await
        .map_err(BatchError::Collection)?;
    let credential = factory::build_credential(&cfg)?
        .credential()
        .await
        .map_err(BatchError::Auth)?;
    let subjects = load_subjects(
        &expand_path(&cfg.batch.subjects_file),
        &cfg.batch.name_keys,
    )?;

    let ctx = RunContext::new(
        cfg.auth.base_url.clone(),
        credential,
        collection,
        report_root.clone(),
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(target: "apirun.batch", "interrupt received, finishing in-flight runs");
            let _ = cancel_tx.send(true);
        }
    });

    let orchestrator = BatchOrchestrator::new(
        factory::build_runner(&cfg),
        BatchOptions::from_config(&cfg.batch, &cfg.tool),
    )
    .with_cancel(cancel_rx);
    let summary = orchestrator.run(&subjects, &ctx).await;

    let summary_path = report_root.join(FAILURE_SUMMARY_FILE);
    let summary_file = persist_failure_summary(&summary, &summary_path);
    print_summary(&summary, summary_file.as_deref());

    match publish_skip_reason(&cfg) {
        Some(reason) => println!("Publishing: skipped ({reason})"),
        None => publish_reports(&cfg, &summary, summary_file.as_deref()).await,
    }

    Ok(exit_code(&summary, args.allow_failures))
}

/// Writes the failure summary, removing one left by an earlier batch when
/// this batch has no failures. Write errors are logged, not fatal.
fn persist_failure_summary(summary: &BatchSummary, path: &Path) -> Option<PathBuf> {
    match summary.write_failure_summary(path) {
        Ok(true) => Some(path.to_path_buf()),
        Ok(false) => {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(target: "apirun.batch", path = %path.display(), error = %e, "could not remove stale failure summary");
                }
            }
            None
        }
        Err(e) => {
            tracing::error!(target: "apirun.batch", path = %path.display(), error = %e, "could not write failure summary");
            None
        }
    }
}

fn print_summary(summary: &BatchSummary, summary_file: Option<&Path>) {
    println!(
        "Batch {}: {} subjects, {} passed, {} failed, {} skipped, {} failures{}",
        summary.batch_id,
        summary.total_subjects,
        summary.passed_count(),
        summary.failed_count(),
        summary.skipped_count(),
        summary.failures.len(),
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    if !summary.skipped_subjects.is_empty() {
        let names: Vec<String> = summary
            .skipped_subjects
            .iter()
            .map(|n| format!("{n:?}"))
            .collect();
        println!("Skipped subjects: {}", names.join(", "));
    }
    for f in &summary.failures {
        println!("  FAILED {} :: {}", f.request_label, f.error_message);
    }
    if let Some(path) = summary_file {
        println!("Failure summary: {}", path.display());
    }
}

/// Publishing is best-effort, so a missing bucket only skips it.
fn publish_skip_reason(cfg: &AppConfig) -> Option<&'static str> {
    if !cfg.publish.enabled {
        Some("disabled")
    } else if cfg.publish.bucket.trim().is_empty() {
        Some("no bucket configured")
    } else {
        None
    }
}

async fn publish_reports(cfg: &AppConfig, summary: &BatchSummary, summary_file: Option<&Path>) {
    let publisher = match factory::build_publisher(cfg).await {
        Ok(Some(p)) => p,
        Ok(None) => return,
        Err(e) => {
            tracing::error!(target: "apirun.publish", error = %format!("{e:#}"), "object store unavailable");
            println!("Publishing: skipped ({e:#})");
            return;
        }
    };

    let mut artifacts: Vec<PathBuf> = summary
        .subjects
        .iter()
        .filter_map(|s| s.report_artifact.clone())
        .collect();
    if cfg.publish.include_failure_summary {
        artifacts.extend(summary_file.map(Path::to_path_buf));
    }
    if artifacts.is_empty() {
        println!("Publishing: skipped (no report artifacts)");
        return;
    }

    for path in &artifacts {
        publish_one(&publisher, path).await;
    }
}

async fn publish_one(publisher: &ReportPublisher, path: &Path) {
    match publisher.publish(path).await {
        Ok(PublishOutcome::Published(link)) => println!(
            "Report {}: {} (valid for {}s)",
            path.display(),
            link.url,
            link.expires_in.as_secs()
        ),
        Ok(PublishOutcome::Skipped { path, reason }) => {
            println!("Report {}: skipped ({reason})", path.display())
        }
        Err(e) => {
            tracing::error!(target: "apirun.publish", path = %path.display(), error = %e, "publish failed");
            println!("Report {}: publish failed ({e})", path.display());
        }
    }
}

pub fn exit_code(summary: &BatchSummary, allow_failures: bool) -> i32 {
    if summary.is_failed() && !allow_failures {
        EXIT_FAILURES
    } else {
        EXIT_OK
    }
}
