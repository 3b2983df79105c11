//! Verdict rendering
//!
//! Turns one submission record into the message sent to the user.

use serde_json::Value;

use crate::domain::{ReviewStatus, SubmissionRecord, VerdictText};
use crate::error::{Error, Result};

/// Maps submission records to verdict messages
pub struct VerdictMapper;

impl VerdictMapper {
    /// Render a raw submission record into message text
    ///
    /// # Errors
    /// - [`Error::MalformedRecord`] if `homework_name` or `status` is absent
    /// - [`Error::UnknownStatus`] if `status` is not in the verdict table
    pub fn render(record: &Value) -> Result<VerdictText> {
        let record = Self::extract(record)?;
        let status: ReviewStatus = record.status_code.parse()?;

        Ok(VerdictText::new(format!(
            "Изменился статус проверки работы \"{}\". {}",
            record.name,
            status.verdict()
        )))
    }

    /// Pull the required fields out of a raw record
    pub fn extract(record: &Value) -> Result<SubmissionRecord> {
        let Value::Object(fields) = record else {
            return Err(Error::MalformedRecord(
                "record is not a JSON object".to_string(),
            ));
        };

        let field = |key: &str| -> Result<String> {
            match fields.get(key) {
                Some(Value::String(value)) => Ok(value.clone()),
                Some(_) => Err(Error::MalformedRecord(format!("'{key}' is not a string"))),
                None => Err(Error::MalformedRecord(format!("missing key '{key}'"))),
            }
        };

        Ok(SubmissionRecord {
            name: field("homework_name")?,
            status_code: field("status")?,
        })
    }
}
