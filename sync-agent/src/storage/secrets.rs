//! Drive credential retrieval from the secret store.
//!
//! Credentials are fetched at the start of every pass and never cached
//! across invocations.

use serde::Deserialize;

use crate::config::SecretsConfig;
use crate::utils::errors::{Result, SyncError};

/// Service account credentials for the drive API.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceCredentials {
    /// Bearer token presented on listing and download calls
    pub token: String,

    /// Service account identity, informational only
    #[serde(default)]
    pub account: Option<String>,
}

/// The secret store wraps the credential JSON in an envelope, the way
/// managed secret services return it.
#[derive(Debug, Deserialize)]
struct SecretEnvelope {
    secret_string: String,
}

/// Parse the credential document out of a secret envelope body.
pub fn parse_secret_payload(body: &str) -> Result<ServiceCredentials> {
    let envelope: SecretEnvelope = serde_json::from_str(body)
        .map_err(|e| SyncError::Secrets(format!("malformed secret envelope: {e}")))?;
    serde_json::from_str(&envelope.secret_string)
        .map_err(|e| SyncError::Secrets(format!("malformed credential document: {e}")))
}

/// Client for the secret store API.
pub struct SecretsClient {
    client: reqwest::Client,
    base_url: String,
}

impl SecretsClient {
    pub fn new(client: reqwest::Client, config: &SecretsConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch credentials by secret id. Must succeed before listing starts.
    pub async fn fetch(&self, secret_id: &str) -> Result<ServiceCredentials> {
        let body = self
            .client
            .get(format!("{}/secrets/{}", self.base_url, secret_id))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SyncError::Secrets(e.to_string()))?
            .text()
            .await
            .map_err(|e| SyncError::Secrets(e.to_string()))?;

        parse_secret_payload(&body)
    }
}
