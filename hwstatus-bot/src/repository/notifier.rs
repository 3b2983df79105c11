//! Notifier repository
//!
//! Delivers status messages to a single Telegram chat.

use async_trait::async_trait;
use hwstatus_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Repository trait for the messaging sink
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `text` to the configured destination
    ///
    /// No retries happen here; any transport fault is reported as
    /// [`Error::DeliveryFailed`] and the caller decides what to do.
    async fn send(&self, text: &str) -> Result<()>;
}

/// Telegram Bot API implementation of Notifier
pub struct TelegramNotifier {
    client: Client,
    api_url: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Creates a new Telegram notifier
    ///
    /// # Arguments
    /// * `api_url` - Bot API base URL (e.g., "https://api.telegram.org")
    /// * `token` - Bot token
    /// * `chat_id` - Chat that receives every message
    #[allow(dead_code)]
    pub fn new(api_url: String, token: String, chat_id: String) -> Self {
        Self::with_client(api_url, token, chat_id, Client::new())
    }

    /// Creates a new Telegram notifier with a custom HTTP client
    pub fn with_client(api_url: String, token: String, chat_id: String, client: Client) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
            chat_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        debug!(chat_id = %self.chat_id, "Sending message to Telegram");

        // The token is part of the path, keep it out of error messages
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);

        let response = self
            .client
            .post(&url)
            .json(&SendMessageRequest {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            .map_err(|e| Error::DeliveryFailed(e.without_url().to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::DeliveryFailed(format!(
                "Failed to read Telegram API response (status {}): {}",
                status.as_u16(),
                e.without_url()
            ))
        })?;
        let reply = serde_json::from_str::<BotApiResponse>(&body).ok();

        match reply {
            Some(BotApiResponse { ok: true, .. }) if status.is_success() => Ok(()),
            Some(BotApiResponse {
                description: Some(description),
                ..
            }) => Err(Error::DeliveryFailed(format!(
                "Telegram API error (status {}): {}",
                status.as_u16(),
                description
            ))),
            _ => Err(Error::DeliveryFailed(format!(
                "Unexpected Telegram API response (status {}): {}",
                status.as_u16(),
                body
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct BotApiResponse {
    ok: bool,
    description: Option<String>,
}
