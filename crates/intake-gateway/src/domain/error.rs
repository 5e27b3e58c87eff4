//! Gateway error types.
//!
//! [`ApiError`] is the only error that crosses the trust boundary. It carries
//! an HTTP status and a sanitized message; internal detail is logged when the
//! error is built and never rendered.

use super::submission::SubmissionError;
use super::validation::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::error;

/// Caller-facing messages
pub mod messages {
    pub const INVALID_DATA_FORMAT: &str = "Invalid data format";
    pub const PROVIDER_ERROR: &str = "Alloy API error";
    pub const SERVICE_UNAVAILABLE: &str = "Unable to connect to verification service";
    pub const TIMEOUT: &str = "Request timed out. Please try again.";
    pub const UNEXPECTED: &str = "An unexpected error occurred";
    pub const RATE_LIMITED: &str = "Rate limit exceeded";
}

/// HTTP-facing error with a sanitized message
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Response status
    pub status: StatusCode,
    /// Message rendered as `{"error": message}`
    pub message: String,
    /// Optional extra fields merged into the body
    pub data: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    /// Create error with additional body fields
    pub fn with_data(
        status: StatusCode,
        message: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            data: Some(data),
        }
    }

    /// 400 with a specific validation message
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 400 for a body that could not be read as a submission
    pub fn invalid_data_format() -> Self {
        Self::bad_request(messages::INVALID_DATA_FORMAT)
    }

    /// Provider answered with something other than 201; its status is relayed
    pub fn provider_status(status: StatusCode) -> Self {
        Self::new(status, messages::PROVIDER_ERROR)
    }

    /// 503: provider could not be reached
    pub fn service_unavailable() -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, messages::SERVICE_UNAVAILABLE)
    }

    /// 504: provider did not answer in time
    pub fn timeout() -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, messages::TIMEOUT)
    }

    /// 500 with a generic message. `detail` is logged, not returned.
    pub fn unexpected(detail: impl fmt::Display) -> Self {
        error!(detail = %detail, "Unexpected error");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, messages::UNEXPECTED)
    }

    /// 429 with the quota that was exceeded
    pub fn rate_limited(quota: &str, retry_after: Duration) -> Self {
        Self::with_data(
            StatusCode::TOO_MANY_REQUESTS,
            format!("{}: {}", messages::RATE_LIMITED, quota),
            serde_json::json!({
                "retry_after_ms": retry_after.as_millis() as u64
            }),
        )
    }

    /// JSON body for this error
    pub fn body(&self) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert("error".into(), serde_json::Value::String(self.message.clone()));
        if let Some(serde_json::Value::Object(extra)) = &self.data {
            for (k, v) in extra {
                body.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        serde_json::Value::Object(body)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = self.body();
        (self.status, Json(body)).into_response()
    }
}

/// Wire shape of an error body, for clients and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        match e {
            ValidationError::UnparsableBirthDate => ApiError::invalid_data_format(),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(_: SubmissionError) -> Self {
        ApiError::invalid_data_format()
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::Status(status) => ApiError::provider_status(status),
            ProviderError::Unavailable(_) => ApiError::service_unavailable(),
            ProviderError::Timeout(_) => ApiError::timeout(),
            ProviderError::Unexpected(detail) => ApiError::unexpected(detail),
        }
    }
}

/// Result type for handler operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure kinds of a provider call, inspected by the handler
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// Provider answered with a status other than 201 Created
    #[error("provider returned status {0}")]
    Status(StatusCode),

    /// Connection refused, DNS failure, TLS failure, ...
    #[error("provider unreachable: {0}")]
    Unavailable(String),

    /// No answer within the configured timeout
    #[error("provider request timed out after {0:?}")]
    Timeout(Duration),

    /// Anything else, including an undecodable success body
    #[error("unexpected provider failure: {0}")]
    Unexpected(String),
}

/// Service-level errors (startup, serving)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// Provider client could not be constructed
    #[error("provider client error: {0}")]
    Client(String),

    /// Server loop failed
    #[error("server error: {0}")]
    Serve(String),
}
