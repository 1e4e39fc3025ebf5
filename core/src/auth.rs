use async_trait::async_trait;

use crate::context::AuthCredential;

/// Produces the credential injected into every run.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn credential(&self) -> anyhow::Result<AuthCredential>;
}

/// A pre-issued token; no exchange happens.
pub struct StaticCredential {
    credential: AuthCredential,
}

impl StaticCredential {
    pub fn new(credential: AuthCredential) -> Self {
        Self { credential }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredential {
    fn name(&self) -> &str {
        "static"
    }

    async fn credential(&self) -> anyhow::Result<AuthCredential> {
        if self.credential.web_token.trim().is_empty() {
            anyhow::bail!("pre-issued web token is empty");
        }
        Ok(self.credential.clone())
    }
}
