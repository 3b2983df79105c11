//! Status source repository
//!
//! Fetches homework status changes from the review API.

use async_trait::async_trait;
use hwstatus_core::{Error, Result, Watermark};
use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use tracing::debug;

/// Repository trait for the remote status source
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetches status changes newer than `since`
    ///
    /// Returns the decoded payload as-is; shape checks belong to
    /// [`hwstatus_core::ResponseValidator`].
    ///
    /// # Errors
    /// - [`Error::SourceUnavailable`] when the request cannot complete
    /// - [`Error::SourceRejected`] on a non-success status code
    /// - [`Error::MalformedReply`] when the body is not JSON
    async fn fetch(&self, since: Watermark) -> Result<Value>;
}

/// HTTP implementation of StatusSource
pub struct HttpStatusSource {
    client: Client,
    endpoint: String,
    credential: String,
}

impl HttpStatusSource {
    /// Creates a new HTTP status source
    ///
    /// # Arguments
    /// * `endpoint` - Full URL of the homework statuses endpoint
    /// * `credential` - OAuth token of the tracked account
    #[allow(dead_code)]
    pub fn new(endpoint: String, credential: String) -> Self {
        Self::with_client(endpoint, credential, Client::new())
    }

    /// Creates a new HTTP status source with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(endpoint: String, credential: String, client: Client) -> Self {
        Self {
            client,
            endpoint,
            credential,
        }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch(&self, since: Watermark) -> Result<Value> {
        debug!(from_date = %since, "Requesting homework statuses");

        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.credential))
            .query(&[("from_date", since.as_unix())])
            .send()
            .await
            .map_err(|e| Error::SourceUnavailable(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::SourceRejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| {
            Error::SourceUnavailable(format!(
                "Failed to read response body: {}",
                e.without_url()
            ))
        })?;

        debug!(bytes = body.len(), "Received reply from status source");

        serde_json::from_str(&body)
            .map_err(|e| Error::MalformedReply(format!("Response body is not JSON: {}", e)))
    }
}
