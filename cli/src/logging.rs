use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use apirun_core::api::{expand_path, AppConfig};

/// Console logging on stderr plus an optional plain-text log file.
/// `RUST_LOG` wins over the configured filter. Keep the guard alive until
/// exit so buffered file output is flushed.
pub fn init(cfg: &AppConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.logging.filter))
        .with_context(|| format!("invalid log filter {:?}", cfg.logging.filter))?;

    let console = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let (file_layer, guard) = match cfg.logging.file.as_deref() {
        Some(raw) if !raw.trim().is_empty() => {
            let path = expand_path(raw);
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log dir {}", dir.display()))?;
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "apirun.log".into());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;
    Ok(guard)
}
