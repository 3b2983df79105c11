//! Core domain types
//!
//! These types describe what a poll cycle moves around: the cursor that
//! marks consumed updates, the validated reply of the status source, and
//! the records and verdicts derived from it.

pub mod homework;
pub mod watermark;

pub use homework::{ReviewStatus, StatusReply, SubmissionRecord, VerdictText};
pub use watermark::Watermark;
