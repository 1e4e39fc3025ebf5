use std::collections::HashMap;
use std::path::Path;

use apirun_core::api as core_api;
use apirun_core::api::{AuthInjection, Reporter, ToolConfig};

/// Plans `newman run` invocations, one per subject.
pub struct NewmanPlanner {
    program: String,
    reporters: Vec<Reporter>,
    auth_injection: AuthInjection,
    dark_theme: bool,
    extra_args: Vec<String>,
}

impl NewmanPlanner {
    pub fn new(cfg: &ToolConfig) -> Self {
        Self {
            program: cfg.program.clone(),
            reporters: cfg.effective_reporters(),
            auth_injection: cfg.auth_injection,
            dark_theme: cfg.dark_theme,
            extra_args: cfg.extra_args.clone(),
        }
    }
}

impl core_api::CommandPlanner for NewmanPlanner {
    fn name(&self) -> &str {
        "newman"
    }

    fn plan(
        &self,
        descriptor: &core_api::RunDescriptor,
        ctx: &core_api::RunContext,
    ) -> core_api::CommandPlan {
        let mut args: Vec<String> = vec![
            "run".to_string(),
            path_arg(ctx.collection()),
            "--iteration-data".to_string(),
            path_arg(&descriptor.iteration_data_path),
        ];

        let flag = self.auth_injection.flag();
        args.push(flag.to_string());
        args.push(format!("{}={}", core_api::BASE_URL_VAR, ctx.base_url()));
        args.push(flag.to_string());
        args.push(format!("{}={}", core_api::AUTH_TOKEN_VAR, ctx.auth().to_json()));

        let names: Vec<&str> = self.reporters.iter().map(Reporter::as_str).collect();
        args.push("--reporters".to_string());
        args.push(names.join(","));

        for reporter in &self.reporters {
            match reporter {
                Reporter::Json => {
                    args.push("--reporter-json-export".to_string());
                    args.push(path_arg(&descriptor.result_artifact_path));
                }
                Reporter::Htmlextra => {
                    args.push("--reporter-htmlextra-export".to_string());
                    args.push(path_arg(&descriptor.report_artifact_path));
                    args.push("--reporter-htmlextra-title".to_string());
                    args.push(descriptor.report_title.clone());
                    if self.dark_theme {
                        args.push("--reporter-htmlextra-darkTheme".to_string());
                        args.push("true".to_string());
                    }
                }
                Reporter::Allure => {
                    args.push("--reporter-allure-export".to_string());
                    args.push(path_arg(&descriptor.allure_results_path));
                }
            }
        }

        args.extend(self.extra_args.iter().cloned());

        tracing::debug!(
            target: "apirun.runner",
            subject = %descriptor.subject.name,
            reporters = %names.join(","),
            "planned newman run"
        );

        core_api::CommandPlan {
            program: self.program.clone(),
            args,
            envs: HashMap::new(),
        }
    }
}

fn path_arg(p: &Path) -> String {
    p.display().to_string()
}
