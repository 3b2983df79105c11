//! Bot configuration
//!
//! Defines the credentials, destination and timing parameters of the bot.
//! Values come from the environment once at startup and are never
//! re-read while the poller runs.

use hwstatus_core::Error;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Review API endpoint polled for status changes
pub const DEFAULT_SOURCE_ENDPOINT: &str =
    "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Telegram Bot API base URL
pub const DEFAULT_NOTIFIER_API_URL: &str = "https://api.telegram.org";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 600;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Bot configuration
#[derive(Clone)]
pub struct Config {
    /// Token sent to the review API in the Authorization header
    pub source_credential: String,

    /// Telegram bot token
    pub notifier_credential: String,

    /// Telegram chat that receives status messages
    pub destination_id: String,

    /// Pause between the end of one poll cycle and the start of the next
    pub poll_interval: Duration,

    /// Review API endpoint
    pub source_endpoint: String,

    /// Telegram Bot API base URL
    pub notifier_api_url: String,

    /// Upper bound on every outbound HTTP request
    pub http_timeout: Duration,

    /// Deliver every record of a reply instead of only the first one
    pub fan_out: bool,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(
        source_credential: String,
        notifier_credential: String,
        destination_id: String,
    ) -> Self {
        Self {
            source_credential,
            notifier_credential,
            destination_id,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            source_endpoint: DEFAULT_SOURCE_ENDPOINT.to_string(),
            notifier_api_url: DEFAULT_NOTIFIER_API_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            fan_out: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SOURCE_CREDENTIAL (required, fallback: PRACTICUM_TOKEN)
    /// - NOTIFIER_CREDENTIAL (required, fallback: TELEGRAM_TOKEN)
    /// - DESTINATION_ID (required, fallback: TELEGRAM_CHAT_ID)
    /// - POLL_INTERVAL_SECONDS (optional, default: 600)
    /// - SOURCE_ENDPOINT (optional)
    /// - NOTIFIER_API_URL (optional, default: https://api.telegram.org)
    /// - HTTP_TIMEOUT_SECONDS (optional, default: 30)
    /// - FAN_OUT (optional, default: false)
    ///
    /// Keys missing from the process environment are looked up in a `.env`
    /// file in the working directory or one of its parents.
    pub fn from_env() -> hwstatus_core::Result<Self> {
        let dotenv = match dotenvy::dotenv_iter() {
            Ok(iter) => collect_dotenv(iter),
            Err(e) => {
                debug!("No .env file loaded: {}", e);
                HashMap::new()
            }
        };
        Self::from_env_and(dotenv)
    }

    /// Creates configuration from environment variables backed by the
    /// given dotenv file
    pub fn from_env_file(path: impl AsRef<Path>) -> hwstatus_core::Result<Self> {
        let path = path.as_ref();
        let dotenv = match dotenvy::from_path_iter(path) {
            Ok(iter) => collect_dotenv(iter),
            Err(e) => {
                debug!("No .env file loaded from {}: {}", path.display(), e);
                HashMap::new()
            }
        };
        Self::from_env_and(dotenv)
    }

    /// Process environment first, then the dotenv values
    fn from_env_and(dotenv: HashMap<String, String>) -> hwstatus_core::Result<Self> {
        Self::from_lookup(|key| {
            std::env::var(key)
                .ok()
                .or_else(|| dotenv.get(key).cloned())
        })
    }

    /// Builds configuration from an arbitrary key lookup
    ///
    /// Empty values count as absent. Every missing required key is
    /// reported at once.
    pub fn from_lookup<F>(lookup: F) -> hwstatus_core::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|&key| lookup(key))
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty())
        };

        let source_credential = get(&["SOURCE_CREDENTIAL", "PRACTICUM_TOKEN"]);
        let notifier_credential = get(&["NOTIFIER_CREDENTIAL", "TELEGRAM_TOKEN"]);
        let destination_id = get(&["DESTINATION_ID", "TELEGRAM_CHAT_ID"]);

        let (Some(source_credential), Some(notifier_credential), Some(destination_id)) =
            (&source_credential, &notifier_credential, &destination_id)
        else {
            let missing: Vec<&str> = [
                ("SOURCE_CREDENTIAL", source_credential.is_none()),
                ("NOTIFIER_CREDENTIAL", notifier_credential.is_none()),
                ("DESTINATION_ID", destination_id.is_none()),
            ]
            .into_iter()
            .filter_map(|(key, absent)| absent.then_some(key))
            .collect();
            return Err(Error::ConfigMissing(missing.join(", ")));
        };

        let mut config = Self::new(
            source_credential.clone(),
            notifier_credential.clone(),
            destination_id.clone(),
        );

        if let Some(secs) = get(&["POLL_INTERVAL_SECONDS"]).and_then(|s| s.parse::<u64>().ok()) {
            config.poll_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = get(&["HTTP_TIMEOUT_SECONDS"]).and_then(|s| s.parse::<u64>().ok()) {
            config.http_timeout = Duration::from_secs(secs);
        }

        if let Some(endpoint) = get(&["SOURCE_ENDPOINT"]) {
            config.source_endpoint = endpoint;
        }

        if let Some(url) = get(&["NOTIFIER_API_URL"]) {
            config.notifier_api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(flag) = get(&["FAN_OUT"]) {
            config.fan_out = matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }

    /// Enables or disables delivering every record of a reply
    pub fn with_fan_out(mut self, fan_out: bool) -> Self {
        self.fan_out = fan_out;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.source_credential.is_empty() {
            anyhow::bail!("source_credential cannot be empty");
        }

        if self.notifier_credential.is_empty() {
            anyhow::bail!("notifier_credential cannot be empty");
        }

        if self.destination_id.is_empty() {
            anyhow::bail!("destination_id cannot be empty");
        }

        for (name, url) in [
            ("source_endpoint", &self.source_endpoint),
            ("notifier_api_url", &self.notifier_api_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.poll_interval.as_secs() == 0 {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.http_timeout.as_secs() == 0 {
            anyhow::bail!("http_timeout must be greater than 0");
        }

        Ok(())
    }
}

fn collect_dotenv<R: std::io::Read>(iter: dotenvy::Iter<R>) -> HashMap<String, String> {
    iter.filter_map(|item| match item {
        Ok(pair) => Some(pair),
        Err(e) => {
            debug!("Skipping malformed .env line: {}", e);
            None
        }
    })
    .collect()
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("source_credential", &"<redacted>")
            .field("notifier_credential", &"<redacted>")
            .field("destination_id", &self.destination_id)
            .field("poll_interval", &self.poll_interval)
            .field("source_endpoint", &self.source_endpoint)
            .field("notifier_api_url", &self.notifier_api_url)
            .field("http_timeout", &self.http_timeout)
            .field("fan_out", &self.fan_out)
            .finish()
    }
}
