//! Error types for a poll cycle
//!
//! Every component returns [`Error`] so the poll loop can decide, per
//! variant, whether the watermark may move. Only [`Error::ConfigMissing`]
//! is fatal; it can occur before the loop starts and never inside it.

use thiserror::Error;

/// Result type alias for hwstatus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running the poller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Required configuration value absent or empty
    #[error("Missing required configuration: {0}")]
    ConfigMissing(String),

    /// Status source could not be reached (DNS, timeout, connection reset)
    #[error("Status source unavailable: {0}")]
    SourceUnavailable(String),

    /// Status source answered with a non-success status code
    #[error("Status source rejected request (status {status}): {body}")]
    SourceRejected {
        /// HTTP status code
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },

    /// Reply does not have the expected shape
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// A submission record lacks a required field
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// Status code outside the verdict table
    #[error("Unknown homework status: {0}")]
    UnknownStatus(String),

    /// Notifier transport reported an error
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

impl Error {
    /// Short stable label used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigMissing(_) => "config_missing",
            Self::SourceUnavailable(_) => "source_unavailable",
            Self::SourceRejected { .. } => "source_rejected",
            Self::MalformedReply(_) => "malformed_reply",
            Self::MalformedRecord(_) => "malformed_record",
            Self::UnknownStatus(_) => "unknown_status",
            Self::DeliveryFailed(_) => "delivery_failed",
        }
    }

    /// Whether the poll loop can carry on after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ConfigMissing(_))
    }
}
