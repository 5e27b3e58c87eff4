//! Identity intake gateway - validates applicant submissions and relays them
//! to the Alloy evaluation API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     INTAKE GATEWAY                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  CatchPanic → Tracing → CORS → BodyLimit                     │
//! │                       │                                      │
//! │        ┌──────────────┴──────────────┐                       │
//! │   POST /submit                  GET /health                  │
//! │        │                                                     │
//! │   RateLimit (per address, global)                            │
//! │        │                                                     │
//! │   Submission parse → validate_submission                     │
//! │        │                                                     │
//! │   VerificationProvider (AlloyClient)                         │
//! └────────┼─────────────────────────────────────────────────────┘
//!          ▼
//!   Alloy /v1/evaluations
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use intake_gateway::{GatewayConfig, IntakeService};
//!
//! let config = GatewayConfig::from_env()?;
//! let service = IntakeService::new(config)?;
//! service.run(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```
//!
//! # Error mapping
//!
//! | Failure                         | Status                | Body                |
//! |---------------------------------|-----------------------|---------------------|
//! | Unreadable body                 | 400                   | Invalid data format |
//! | Rule violation                  | 400                   | rule message        |
//! | Rate limit                      | 429                   | quota description   |
//! | Provider non-201                | provider's status     | Alloy API error     |
//! | Provider unreachable            | 503                   | generic             |
//! | Provider timeout                | 504                   | generic             |
//! | Anything else                   | 500                   | generic             |

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod ports;
pub mod service;

pub use adapters::AlloyClient;
pub use domain::{
    ApiError, ConfigError, ErrorBody, GatewayConfig, GatewayError, ProviderCredentials,
    ProviderError, ProviderOutcome, Submission, SubmitResponse, ValidationError,
};
pub use ports::{Clock, FixedClock, SystemClock, VerificationProvider};
pub use service::IntakeService;

/// Crate version, reported by `GET /health`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
