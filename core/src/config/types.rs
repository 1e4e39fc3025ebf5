use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub publish: PublishConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub collection_id: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_registry_url() -> String {
    "https://api.getpostman.com".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_url(),
            api_key: String::new(),
            collection_id: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the API under test; also injected as `base_url`.
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Pre-issued token. When set the login exchange is skipped.
    #[serde(default)]
    pub web_token: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            email: String::new(),
            password: String::new(),
            web_token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_subjects_file")]
    pub subjects_file: String,

    /// Attribute keys whose values make up a subject's name, joined with `" - "`.
    #[serde(default = "default_name_keys")]
    pub name_keys: Vec<String>,

    #[serde(default = "default_report_root")]
    pub report_root: String,

    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Local collection file; skips the registry fetch when set.
    #[serde(default)]
    pub collection_file: Option<String>,

    #[serde(default = "default_capture_bytes")]
    pub capture_bytes: usize,
}

fn default_subjects_file() -> String {
    "companies.json".to_string()
}

fn default_name_keys() -> Vec<String> {
    vec!["companyName".to_string()]
}

fn default_report_root() -> String {
    "results".to_string()
}

fn default_max_parallel() -> usize {
    num_cpus::get().max(1)
}

fn default_run_timeout_secs() -> u64 {
    600
}

fn default_capture_bytes() -> usize {
    65_536
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            subjects_file: default_subjects_file(),
            name_keys: default_name_keys(),
            report_root: default_report_root(),
            max_parallel: default_max_parallel(),
            run_timeout_secs: default_run_timeout_secs(),
            collection_file: None,
            capture_bytes: default_capture_bytes(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reporter {
    Json,
    Htmlextra,
    Allure,
}

impl Reporter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reporter::Json => "json",
            Reporter::Htmlextra => "htmlextra",
            Reporter::Allure => "allure",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthInjection {
    EnvVar,
    GlobalVar,
}

impl AuthInjection {
    pub fn flag(&self) -> &'static str {
        match self {
            AuthInjection::EnvVar => "--env-var",
            AuthInjection::GlobalVar => "--global-var",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IterationDataSource {
    /// One generated single-iteration file per subject, removed after the run.
    PerSubject,
    /// A caller-supplied file handed to every run unchanged.
    Shared { shared_file: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_program")]
    pub program: String,

    #[serde(default = "default_reporters")]
    pub reporters: Vec<Reporter>,

    #[serde(default = "default_auth_injection")]
    pub auth_injection: AuthInjection,

    #[serde(default = "default_iteration_data")]
    pub iteration_data: IterationDataSource,

    #[serde(default = "default_dark_theme")]
    pub dark_theme: bool,

    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_program() -> String {
    "newman".to_string()
}

fn default_reporters() -> Vec<Reporter> {
    vec![Reporter::Json, Reporter::Htmlextra]
}

fn default_auth_injection() -> AuthInjection {
    AuthInjection::EnvVar
}

fn default_iteration_data() -> IterationDataSource {
    IterationDataSource::PerSubject
}

fn default_dark_theme() -> bool {
    true
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            reporters: default_reporters(),
            auth_injection: default_auth_injection(),
            iteration_data: default_iteration_data(),
            dark_theme: default_dark_theme(),
            extra_args: vec![],
        }
    }
}

impl ToolConfig {
    /// Configured reporters with `json` first and duplicates removed.
    /// The result parser depends on the json export, so it is always present.
    pub fn effective_reporters(&self) -> Vec<Reporter> {
        let mut out = vec![Reporter::Json];
        for r in &self.reporters {
            if !out.contains(r) {
                out.push(*r);
            }
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_publish_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_publish_prefix")]
    pub prefix: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    #[serde(default = "default_expires_secs")]
    pub expires_secs: u64,
    #[serde(default)]
    pub include_failure_summary: bool,
}

fn default_publish_enabled() -> bool {
    true
}

fn default_publish_prefix() -> String {
    "reports".to_string()
}

fn default_expires_secs() -> u64 {
    86_400
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            enabled: default_publish_enabled(),
            bucket: String::new(),
            prefix: default_publish_prefix(),
            region: None,
            endpoint: None,
            force_path_style: false,
            expires_secs: default_expires_secs(),
            include_failure_summary: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            filter: default_log_filter(),
        }
    }
}
