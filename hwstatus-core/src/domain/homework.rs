//! Homework domain types

use std::fmt;
use std::str::FromStr;

use super::Watermark;

/// Validated reply of the status source
///
/// Records stay as raw JSON objects: field presence is checked when a
/// record is rendered, not when the reply is validated.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReply {
    pub records: Vec<serde_json::Value>,
    pub cursor: Watermark,
}

/// A submission whose review status changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub name: String,
    pub status_code: String,
}

/// Review status codes the bot knows how to report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl ReviewStatus {
    /// Fixed display text for this status
    pub fn verdict(self) -> &'static str {
        match self {
            Self::Approved => "Работа проверена: ревьюеру всё понравилось. Ура!",
            Self::Reviewing => "Работа взята на проверку ревьюером.",
            Self::Rejected => "Работа проверена: у ревьюера есть замечания.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = crate::Error;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            "approved" => Ok(Self::Approved),
            "reviewing" => Ok(Self::Reviewing),
            "rejected" => Ok(Self::Rejected),
            other => Err(crate::Error::UnknownStatus(other.to_string())),
        }
    }
}

/// Message text rendered from a submission record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerdictText(String);

impl VerdictText {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VerdictText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
