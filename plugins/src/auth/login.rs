use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use apirun_core::api::{AuthCredential, CredentialProvider};

const LOGIN_PATH: &str = "/api/user/login";

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(rename = "webToken")]
    web_token: Option<String>,
}

/// Exchanges email and password for a web token once per batch.
pub struct LoginCredentialProvider {
    client: Client,
    base_url: String,
    email: String,
    password: String,
}

impl LoginCredentialProvider {
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        timeout_ms: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("building login http client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            email: email.into(),
            password: password.into(),
        })
    }
}

#[async_trait]
impl CredentialProvider for LoginCredentialProvider {
    fn name(&self) -> &str {
        "login"
    }

    async fn credential(&self) -> Result<AuthCredential> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        tracing::info!(target: "apirun.batch", email = %self.email, "logging in");

        let resp = self
            .client
            .post(&url)
            .json(&LoginRequest {
                email: &self.email,
                password: &self.password,
            })
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?;

        let status = resp.status();
        if !status.is_success() {
            bail!("login failed with {status}");
        }

        let body: LoginResponse = resp
            .json()
            .await
            .context("login response is not valid JSON")?;
        match body.web_token {
            Some(token) if !token.trim().is_empty() => {
                tracing::info!(target: "apirun.batch", "web token obtained");
                Ok(AuthCredential::new(self.email.clone(), token))
            }
            _ => bail!("login response has no webToken"),
        }
    }
}
