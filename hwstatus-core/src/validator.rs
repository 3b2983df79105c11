//! Status reply validator
//!
//! The status source is untrusted: any deviation from the expected reply
//! shape must surface as [`Error::MalformedReply`] instead of a panic.

use serde_json::Value;

use crate::domain::{StatusReply, Watermark};
use crate::error::{Error, Result};

/// Wire field holding the list of changed submissions
pub const RECORDS_FIELD: &str = "homeworks";

/// Wire field holding the source's current time
pub const CURSOR_FIELD: &str = "current_date";

/// Structural validator for status source replies
pub struct ResponseValidator;

impl ResponseValidator {
    /// Validate a raw reply and split it into records and cursor
    ///
    /// # Errors
    /// Returns [`Error::MalformedReply`] if:
    /// - The payload is not a JSON object
    /// - `homeworks` or `current_date` is absent
    /// - `homeworks` is not an array
    /// - `current_date` is not an integer timestamp
    ///
    /// # Example
    /// ```
    /// use hwstatus_core::ResponseValidator;
    ///
    /// let raw = serde_json::json!({"homeworks": [], "current_date": 2000});
    /// let reply = ResponseValidator::validate(raw)?;
    /// assert!(reply.records.is_empty());
    /// assert_eq!(reply.cursor.as_unix(), 2000);
    /// # Ok::<(), hwstatus_core::Error>(())
    /// ```
    pub fn validate(raw: Value) -> Result<StatusReply> {
        let mut body = match raw {
            Value::Object(body) => body,
            other => {
                return Err(Error::MalformedReply(format!(
                    "expected a JSON object, got {}",
                    type_name(&other)
                )));
            }
        };

        let records = body
            .remove(RECORDS_FIELD)
            .ok_or_else(|| missing(RECORDS_FIELD))?;
        let cursor = body.get(CURSOR_FIELD).ok_or_else(|| missing(CURSOR_FIELD))?;

        let records = match records {
            Value::Array(records) => records,
            other => {
                return Err(Error::MalformedReply(format!(
                    "'{RECORDS_FIELD}' is not a list, got {}",
                    type_name(&other)
                )));
            }
        };

        let cursor = cursor.as_i64().ok_or_else(|| {
            Error::MalformedReply(format!(
                "'{CURSOR_FIELD}' is not an integer timestamp, got {}",
                type_name(cursor)
            ))
        })?;

        Ok(StatusReply {
            records,
            cursor: Watermark::from_unix(cursor),
        })
    }
}

fn missing(field: &str) -> Error {
    Error::MalformedReply(format!("missing key '{field}'"))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
