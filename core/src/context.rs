use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Credential produced by the login exchange (or supplied pre-issued).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredential {
    pub email: String,
    #[serde(rename = "webToken")]
    pub web_token: String,
}

impl AuthCredential {
    pub fn new(email: impl Into<String>, web_token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            web_token: web_token.into(),
        }
    }

    /// JSON form injected as the `Auth-Token` variable.
    pub fn to_json(&self) -> String {
        serde_json::json!({ "email": self.email, "webToken": self.web_token }).to_string()
    }
}

#[derive(Debug)]
struct RunContextInner {
    base_url: String,
    auth: AuthCredential,
    collection: PathBuf,
    report_root: PathBuf,
}

/// Shared, read-only inputs for every run of one batch.
///
/// Built once before the batch starts; clones share the same data.
#[derive(Debug, Clone)]
pub struct RunContext {
    inner: Arc<RunContextInner>,
}

impl RunContext {
    pub fn new(
        base_url: impl Into<String>,
        auth: AuthCredential,
        collection: impl Into<PathBuf>,
        report_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            inner: Arc::new(RunContextInner {
                base_url: base_url.into(),
                auth,
                collection: collection.into(),
                report_root: report_root.into(),
            }),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn auth(&self) -> &AuthCredential {
        &self.inner.auth
    }

    pub fn collection(&self) -> &Path {
        &self.inner.collection
    }

    pub fn report_root(&self) -> &Path {
        &self.inner.report_root
    }
}
