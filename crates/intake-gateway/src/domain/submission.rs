//! Inbound application payload.
//!
//! A [`Submission`] keeps the caller's JSON object intact so it can be
//! forwarded verbatim, and exposes the known fields as strings for the
//! validator.

use super::fields::is_known_field;
use serde::Serialize;
use serde_json::{Map, Value};

/// Errors turning a request body into a [`Submission`]
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// No body at all
    #[error("request body is empty")]
    Empty,
    /// Body is not valid JSON
    #[error("request body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Body is JSON but not an object
    #[error("request body must be a JSON object, got {0}")]
    NotAnObject(&'static str),
    /// A known field carries a non-string value
    #[error("field '{0}' must be a string")]
    NonStringField(String),
}

/// Identity application as submitted by the end user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Submission {
    payload: Map<String, Value>,
}

impl Submission {
    /// Parse a raw request body
    pub fn from_slice(body: &[u8]) -> Result<Self, SubmissionError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(SubmissionError::Empty);
        }
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(value)
    }

    /// Build from an already-parsed JSON value
    pub fn from_value(value: Value) -> Result<Self, SubmissionError> {
        let payload = match value {
            Value::Object(map) => map,
            other => return Err(SubmissionError::NotAnObject(json_kind(&other))),
        };

        // Known fields must be strings (null is treated as absent)
        for (key, value) in &payload {
            if is_known_field(key) && !matches!(value, Value::String(_) | Value::Null) {
                return Err(SubmissionError::NonStringField(key.clone()));
            }
        }

        Ok(Self { payload })
    }

    /// String value of a field; `None` when missing or null
    pub fn get(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Non-empty string value of a field
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// The full object, as forwarded to the provider
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
