//! Watermark domain type

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cursor marking the point up to which status updates have been consumed
///
/// Holds a Unix timestamp in seconds, as reported by the status source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watermark(i64);

impl Watermark {
    /// Creates a watermark from a Unix timestamp
    pub fn from_unix(timestamp: i64) -> Self {
        Self(timestamp)
    }

    /// Watermark at the current wall-clock time
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp())
    }

    /// Unix timestamp carried by this watermark
    pub fn as_unix(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
