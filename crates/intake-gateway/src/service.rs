//! Intake gateway service - HTTP server and submission handler.
//!
//! Routes:
//!
//! - `POST /submit`: validate an application and relay it to the provider
//! - `GET /health`: liveness plus counters

use crate::adapters::AlloyClient;
use crate::domain::config::GatewayConfig;
use crate::domain::error::{ApiError, ApiResult, GatewayError, ProviderError};
use crate::domain::types::{HealthResponse, SubmitResponse};
use crate::domain::{validate_submission, Submission};
use crate::middleware::{
    cleanup_task, create_cors_layer, GatewayMetrics, RateLimitLayer, RateLimitState,
    RequestTimer, SubmissionResult, TracingLayer,
};
use crate::ports::{Clock, SystemClock, VerificationProvider};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn VerificationProvider>,
    clock: Arc<dyn Clock>,
    metrics: Arc<GatewayMetrics>,
    rate_limit: Arc<RateLimitState>,
}

/// Intake gateway service
pub struct IntakeService {
    config: GatewayConfig,
    state: AppState,
}

impl IntakeService {
    /// Create the service with the production Alloy client and system clock
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        if config.provider.credentials.is_empty() {
            return Err(GatewayError::Client(
                "provider credentials are not configured".into(),
            ));
        }
        let client =
            AlloyClient::new(&config.provider).map_err(|e| GatewayError::Client(e.to_string()))?;
        info!(url = %client.evaluations_url(), "Configured Alloy client");

        Self::with_provider(config, Arc::new(client), Arc::new(SystemClock))
    }

    /// Create the service with an explicit provider and clock
    pub fn with_provider(
        config: GatewayConfig,
        provider: Arc<dyn VerificationProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let state = AppState {
            provider,
            clock,
            metrics: Arc::new(GatewayMetrics::new()),
            rate_limit: Arc::new(RateLimitState::new(config.rate_limit.clone())),
        };

        Ok(Self { config, state })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get metrics
    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.state.metrics)
    }

    /// Get rate limit state
    pub fn rate_limit_state(&self) -> Arc<RateLimitState> {
        Arc::clone(&self.state.rate_limit)
    }

    /// Build the HTTP router with the full middleware stack
    pub fn router(&self) -> Router {
        let submit = post(submit_application)
            .layer(RateLimitLayer::from_state(Arc::clone(&self.state.rate_limit)));
        let metrics = Arc::clone(&self.state.metrics);

        Router::new()
            .route("/submit", submit)
            .route("/health", get(health_check))
            .with_state(self.state.clone())
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.config.http.max_body_size))
            .layer(create_cors_layer(&self.config.cors))
            .layer(TracingLayer::new())
            .layer(CatchPanicLayer::custom(
                move |err: Box<dyn Any + Send + 'static>| handle_panic(&metrics, err),
            ))
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GatewayError::Bind(format!("{}: {}", addr, e)))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;

        let rate_limit = Arc::clone(&self.state.rate_limit);
        let interval = self.config.rate_limit.cleanup_interval;
        let max_age = self.config.rate_limit.eviction_age;
        let cleanup = tokio::spawn(cleanup_task(rate_limit, interval, max_age));

        let router = self.router();
        info!(addr = %local_addr, "Starting intake gateway");

        let result = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        cleanup.abort();
        info!("Intake gateway stopped");
        result.map_err(|e| GatewayError::Serve(e.to_string()))
    }
}

/// Handle `POST /submit`
async fn submit_application(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<SubmitResponse>> {
    info!("Received application submission");

    let submission = Submission::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Malformed submission body");
        state.metrics.record_submission(SubmissionResult::Invalid);
        ApiError::from(e)
    })?;

    if let Err(e) = validate_submission(&submission, state.clock.today()) {
        // Messages name fields, never values
        warn!(reason = %e, "Validation failed");
        state.metrics.record_submission(SubmissionResult::Invalid);
        return Err(e.into());
    }

    let timer = RequestTimer::new(Arc::clone(&state.metrics));
    let result = state.provider.create_evaluation(&submission).await;
    timer.finish();

    match result {
        Ok(outcome) => {
            info!(outcome = %outcome.outcome, "Submission evaluated");
            state.metrics.record_submission(SubmissionResult::Accepted);
            Ok(Json(outcome))
        }
        Err(e) => {
            let kind = match &e {
                ProviderError::Status(_) => SubmissionResult::ProviderError,
                ProviderError::Unavailable(_) => SubmissionResult::Unavailable,
                ProviderError::Timeout(_) => SubmissionResult::TimedOut,
                ProviderError::Unexpected(_) => SubmissionResult::Unexpected,
            };
            error!(error = %e, "Provider call failed");
            state.metrics.record_submission(kind);
            Err(e.into())
        }
    }
}

/// Handle `GET /health`
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut metrics = state.metrics.to_json();
    metrics["rate_limiting"] = serde_json::json!({
        "rejected": state.rate_limit.rejected_count(),
        "tracked_addresses": state.rate_limit.window_count(),
    });

    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        metrics,
    })
}

/// Turn a handler panic into the generic 500 body
fn handle_panic(metrics: &GatewayMetrics, err: Box<dyn Any + Send + 'static>) -> Response {
    metrics.record_submission(SubmissionResult::Unexpected);

    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::unexpected(format!("handler panicked: {}", detail)).into_response()
}
