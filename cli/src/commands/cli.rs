use clap::Parser;

use apirun_core::api::{AppConfig, IterationDataSource};

#[derive(Parser, Debug, Clone, Default)]
#[command(version, about = "Run an API test collection once per subject")]
pub struct Args {
    /// Config file (defaults to ./apirun.toml when present).
    #[arg(long, short = 'c', env = "APIRUN_CONFIG")]
    pub config: Option<String>,

    /// JSON array of subject objects.
    #[arg(long)]
    pub subjects: Option<String>,

    /// Use a local collection file instead of fetching from the registry.
    #[arg(long)]
    pub collection_file: Option<String>,

    /// Hand this iteration data file to every run instead of generating one
    /// per subject.
    #[arg(long)]
    pub iteration_data: Option<String>,

    #[arg(long)]
    pub max_parallel: Option<usize>,

    #[arg(long)]
    pub report_root: Option<String>,

    /// Per-subject wall-clock limit.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, default_value_t = false)]
    pub no_publish: bool,

    /// Exit 0 even when subjects failed.
    #[arg(long, default_value_t = false)]
    pub allow_failures: bool,
}

impl Args {
    /// Command-line flags win over file and environment settings.
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(v) = &self.subjects {
            cfg.batch.subjects_file = v.clone();
        }
        if let Some(v) = &self.collection_file {
            cfg.batch.collection_file = Some(v.clone());
        }
        if let Some(v) = &self.iteration_data {
            cfg.tool.iteration_data = IterationDataSource::Shared {
                shared_file: v.clone(),
            };
        }
        if let Some(v) = self.max_parallel {
            cfg.batch.max_parallel = v;
        }
        if let Some(v) = &self.report_root {
            cfg.batch.report_root = v.clone();
        }
        if let Some(v) = self.timeout_secs {
            cfg.batch.run_timeout_secs = v;
        }
        if self.no_publish {
            cfg.publish.enabled = false;
        }
    }
}
