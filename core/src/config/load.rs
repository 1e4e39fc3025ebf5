use std::path::Path;

use crate::error::ConfigError;

use super::types::{AppConfig, IterationDataSource};

pub const DEFAULT_CONFIG_FILE: &str = "apirun.toml";

/// Loads `apirun.toml` from the working directory (defaults when absent) and
/// applies environment overrides.
pub fn load_default() -> Result<AppConfig, ConfigError> {
    let mut cfg = if Path::new(DEFAULT_CONFIG_FILE).exists() {
        read_toml(Path::new(DEFAULT_CONFIG_FILE))?
    } else {
        AppConfig::default()
    };
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok())?;
    Ok(cfg)
}

/// Loads an explicitly named config file; a missing file is an error here.
pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let mut cfg = read_toml(path)?;
    apply_env_overrides(&mut cfg, |k| std::env::var(k).ok())?;
    Ok(cfg)
}

fn read_toml(path: &Path) -> Result<AppConfig, ConfigError> {
    let s = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse(e.into()))?;
    toml::from_str::<AppConfig>(&s).map_err(|e| ConfigError::Parse(e.into()))
}

pub fn apply_env_overrides<F>(cfg: &mut AppConfig, get: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("POSTMAN_API_KEY") {
        cfg.registry.api_key = v;
    }
    if let Some(v) = non_empty("COLLECTION_UID") {
        cfg.registry.collection_id = v;
    }
    if let Some(v) = non_empty("BASE_URL") {
        cfg.auth.base_url = v;
    }
    if let Some(v) = non_empty("EMAIL") {
        cfg.auth.email = v;
    }
    if let Some(v) = non_empty("PASSWORD") {
        cfg.auth.password = v;
    }
    if let Some(v) = non_empty("WEB_TOKEN") {
        cfg.auth.web_token = Some(v);
    }
    if let Some(v) = non_empty("S3_BUCKET_NAME") {
        cfg.publish.bucket = v;
    }
    if let Some(v) = non_empty("AWS_DEFAULT_REGION") {
        cfg.publish.region = Some(v);
    }
    if let Some(v) = non_empty("APIRUN_MAX_PARALLEL") {
        cfg.batch.max_parallel =
            v.trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::EnvInvalid {
                    key: "APIRUN_MAX_PARALLEL".to_string(),
                    source: e.into(),
                })?;
    }
    Ok(())
}

/// Checks the preconditions a batch needs before anything runs.
pub fn validate(cfg: &AppConfig) -> Result<(), ConfigError> {
    if cfg.batch.collection_file.is_none() {
        if cfg.registry.api_key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "registry api key is required when no local collection is given".into(),
            ));
        }
        if cfg.registry.collection_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "collection id is required when no local collection is given".into(),
            ));
        }
    }
    if cfg.auth.base_url.trim().is_empty() {
        return Err(ConfigError::Validation("base url is required".into()));
    }
    if cfg.auth.email.trim().is_empty() {
        return Err(ConfigError::Validation("email is required".into()));
    }
    let has_token = cfg
        .auth
        .web_token
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    if !has_token && cfg.auth.password.is_empty() {
        return Err(ConfigError::Validation(
            "either a password or a pre-issued web token is required".into(),
        ));
    }
    if cfg.batch.name_keys.is_empty() {
        return Err(ConfigError::Validation("batch.name_keys must not be empty".into()));
    }
    if cfg.batch.max_parallel == 0 {
        return Err(ConfigError::Validation("batch.max_parallel must be at least 1".into()));
    }
    if cfg.batch.run_timeout_secs == 0 {
        return Err(ConfigError::Validation("batch.run_timeout_secs must be at least 1".into()));
    }
    if let IterationDataSource::Shared { shared_file } = &cfg.tool.iteration_data {
        if shared_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tool.iteration_data.shared_file must be set in shared mode".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::{AuthInjection, Reporter};

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.registry.api_key = "key".into();
        cfg.registry.collection_id = "uid".into();
        cfg.auth.base_url = "https://api.example.test".into();
        cfg.auth.email = "qa@example.test".into();
        cfg.auth.password = "secret".into();
        cfg
    }

    #[test]
    fn toml_sections_fill_in_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [batch]
            name_keys = ["companyName", "module"]
            max_parallel = 3

            [tool]
            reporters = ["htmlextra", "allure"]
            auth_injection = "global_var"
            iteration_data = { mode = "shared", shared_file = "data.json" }
            "#,
        )
        .unwrap();

        assert_eq!(cfg.batch.name_keys, vec!["companyName", "module"]);
        assert_eq!(cfg.batch.max_parallel, 3);
        assert_eq!(cfg.batch.report_root, "results");
        assert_eq!(cfg.tool.program, "newman");
        assert_eq!(cfg.tool.auth_injection, AuthInjection::GlobalVar);
        assert_eq!(
            cfg.tool.iteration_data,
            IterationDataSource::Shared {
                shared_file: "data.json".into()
            }
        );
        assert_eq!(
            cfg.tool.effective_reporters(),
            vec![Reporter::Json, Reporter::Htmlextra, Reporter::Allure]
        );
        assert_eq!(cfg.publish.expires_secs, 86_400);
    }

    #[test]
    fn env_overrides_ignore_blank_values() {
        let mut cfg = AppConfig::default();
        let vars = env(&[
            ("BASE_URL", "https://api.example.test"),
            ("EMAIL", "   "),
            ("WEB_TOKEN", "tok"),
            ("S3_BUCKET_NAME", "bucket"),
        ]);
        apply_env_overrides(&mut cfg, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(cfg.auth.base_url, "https://api.example.test");
        assert_eq!(cfg.auth.email, "");
        assert_eq!(cfg.auth.web_token.as_deref(), Some("tok"));
        assert_eq!(cfg.publish.bucket, "bucket");
    }

    #[test]
    fn invalid_parallelism_env_is_rejected() {
        let mut cfg = AppConfig::default();
        let vars = env(&[("APIRUN_MAX_PARALLEL", "many")]);
        let err = apply_env_overrides(&mut cfg, |k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::EnvInvalid { ref key, .. } if key == "APIRUN_MAX_PARALLEL"));
    }

    #[test]
    fn validate_accepts_complete_config() {
        assert!(validate(&valid()).is_ok());
    }

    #[test]
    fn validate_requires_password_or_token() {
        let mut cfg = valid();
        cfg.auth.password.clear();
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));

        cfg.auth.web_token = Some("issued".into());
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn local_collection_skips_registry_requirements() {
        let mut cfg = valid();
        cfg.registry.api_key.clear();
        assert!(validate(&cfg).is_err());

        cfg.batch.collection_file = Some("collection.json".into());
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn missing_bucket_does_not_block_the_batch() {
        let mut cfg = valid();
        cfg.publish.enabled = true;
        cfg.publish.bucket = "  ".into();
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn missing_explicit_config_file_is_not_found() {
        let err = load_from_path(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
