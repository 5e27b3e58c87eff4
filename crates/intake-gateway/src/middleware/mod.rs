//! Middleware stack for the intake gateway.
//!
//! Layer order (outermost first):
//! Request → CatchPanic → Tracing → CORS → BodyLimit → [RateLimit on /submit] → Handler

pub mod cors;
pub mod metrics;
pub mod rate_limit;
pub mod tracing;

pub use cors::create_cors_layer;
pub use metrics::{GatewayMetrics, RequestTimer, SubmissionResult};
pub use rate_limit::{cleanup_task, RateLimitLayer, RateLimitRejection, RateLimitState};
pub use self::tracing::TracingLayer;
