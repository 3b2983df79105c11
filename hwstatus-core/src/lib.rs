//! hwstatus Core
//!
//! Core types and pure logic for the homework status bot.
//!
//! This crate contains:
//! - Domain types: watermark, status replies, submission records, verdict text
//! - Error taxonomy shared by every component of a poll cycle
//! - ResponseValidator: structural checks on untrusted status source replies
//! - VerdictMapper: status code to human-readable message rendering

pub mod domain;
pub mod error;
pub mod validator;
pub mod verdict;

pub use domain::{ReviewStatus, StatusReply, SubmissionRecord, VerdictText, Watermark};
pub use error::{Error, Result};
pub use validator::ResponseValidator;
pub use verdict::VerdictMapper;
