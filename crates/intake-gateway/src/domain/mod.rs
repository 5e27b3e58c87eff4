//! Domain types for the intake gateway.
//!
//! Configuration, the field registry, submission parsing, validation rules
//! and the error taxonomy. Nothing in here performs I/O.

pub mod config;
pub mod error;
pub mod fields;
pub mod submission;
pub mod types;
pub mod validation;

// Re-exports for convenience
pub use config::{ConfigError, GatewayConfig, ProviderCredentials, RateLimitConfig};
pub use error::{ApiError, ApiResult, ErrorBody, GatewayError, ProviderError};
pub use fields::{get_field_info, required_fields, FieldInfo, FIELDS};
pub use submission::{Submission, SubmissionError};
pub use types::{EvaluationResponse, HealthResponse, ProviderOutcome, SubmitResponse};
pub use validation::{validate_submission, ValidationError};
