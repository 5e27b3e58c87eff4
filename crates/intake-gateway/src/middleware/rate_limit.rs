//! Rate limiting middleware for the submission route.
//!
//! Two fixed-window quotas:
//!
//! - per client address: `per_address_per_minute` in each one-minute window
//!   (default 5)
//! - global across all clients: `global_per_hour` in each one-hour window
//!   (default 100)
//!
//! A window opens with the first request after the previous one expired, and
//! its count resets only when it closes. `Retry-After` is the time left until
//! the window closes.
//!
//! The per-address quota is checked first, so a client that is already over
//! its own limit does not drain the global budget.

use crate::domain::config::RateLimitConfig;
use crate::domain::error::ApiError;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderValue, Request},
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::{Layer, Service};
use tracing::{debug, warn};

/// Length of the per-address window
pub const PER_ADDRESS_WINDOW: Duration = Duration::from_secs(60);
/// Length of the global window
pub const GLOBAL_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Admitted-request counter for one fixed window
#[derive(Debug)]
struct WindowCounter {
    window_start: Instant,
    count: u32,
    /// Last access time (for cleanup)
    last_access: Instant,
}

impl WindowCounter {
    fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            count: 0,
            last_access: now,
        }
    }

    /// Admit one request at `now`, or return the time until the window closes
    fn try_acquire(&mut self, now: Instant, limit: u32, window: Duration) -> Result<(), Duration> {
        self.last_access = now;

        let mut elapsed = now.saturating_duration_since(self.window_start);
        if self.count == 0 || elapsed >= window {
            self.window_start = now;
            self.count = 0;
            elapsed = Duration::ZERO;
        }

        if self.count < limit {
            self.count += 1;
            Ok(())
        } else {
            Err(window.saturating_sub(elapsed))
        }
    }
}

/// Which quota rejected a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitRejection {
    PerAddress { retry_after: Duration },
    Global { retry_after: Duration },
}

impl RateLimitRejection {
    pub fn retry_after(&self) -> Duration {
        match self {
            Self::PerAddress { retry_after } | Self::Global { retry_after } => *retry_after,
        }
    }
}

/// Rate limiter state shared across requests
pub struct RateLimitState {
    /// Per-address windows
    windows: DashMap<IpAddr, WindowCounter>,
    /// Window shared by every client
    global: Mutex<WindowCounter>,
    config: RateLimitConfig,
    rejected: AtomicU64,
}

impl RateLimitState {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: DashMap::new(),
            global: Mutex::new(WindowCounter::new(Instant::now())),
            config,
            rejected: AtomicU64::new(0),
        }
    }

    /// Check if a request from `ip` should be admitted
    pub fn check(&self, ip: IpAddr) -> Result<(), RateLimitRejection> {
        self.check_at(ip, Instant::now())
    }

    /// Check if a request from `ip` arriving at `now` should be admitted
    pub fn check_at(&self, ip: IpAddr, now: Instant) -> Result<(), RateLimitRejection> {
        if !self.config.enabled {
            return Ok(());
        }

        if !self.config.exempt.contains(&ip) {
            let mut window = self.windows.entry(ip).or_insert_with(|| {
                debug!(ip = %ip, "Opening rate limit window");
                WindowCounter::new(now)
            });

            let admitted =
                window.try_acquire(now, self.config.per_address_per_minute, PER_ADDRESS_WINDOW);
            if let Err(retry_after) = admitted {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                return Err(RateLimitRejection::PerAddress { retry_after });
            }
        }

        self.global
            .lock()
            .try_acquire(now, self.config.global_per_hour, GLOBAL_WINDOW)
            .map_err(|retry_after| {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                RateLimitRejection::Global { retry_after }
            })
    }

    /// Human-readable quota that produced a rejection
    pub fn describe(&self, rejection: &RateLimitRejection) -> String {
        match rejection {
            RateLimitRejection::PerAddress { .. } => {
                format!("{} per 1 minute", self.config.per_address_per_minute)
            }
            RateLimitRejection::Global { .. } => {
                format!("{} per 1 hour", self.config.global_per_hour)
            }
        }
    }

    /// Drop per-address windows idle longer than `max_age` (call periodically)
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.windows.retain(|ip, window| {
            let age = now.saturating_duration_since(window.last_access);
            if age > max_age {
                debug!(ip = %ip, age_secs = age.as_secs(), "Removing stale rate limit window");
                false
            } else {
                true
            }
        });
    }

    /// Get number of tracked addresses
    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    /// Requests rejected so far
    pub fn rejected_count(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn trusts_forwarded_headers(&self) -> bool {
        self.config.trust_forwarded_headers
    }
}

/// Rate limit layer
#[derive(Clone)]
pub struct RateLimitLayer {
    state: Arc<RateLimitState>,
}

impl RateLimitLayer {
    /// Layer sharing `state` with the rest of the service
    pub fn from_state(state: Arc<RateLimitState>) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            state: Arc::clone(&self.state),
        }
    }
}

/// Rate limit service
#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    state: Arc<RateLimitState>,
}

impl<S> Service<Request<Body>> for RateLimitService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = Arc::clone(&self.state);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let ip = extract_client_ip(&req, state.trusts_forwarded_headers());

            match state.check(ip) {
                Ok(()) => inner.call(req).await,
                Err(rejection) => {
                    let retry_after = rejection.retry_after();
                    warn!(
                        ip = %ip,
                        retry_after_ms = retry_after.as_millis() as u64,
                        quota = ?rejection,
                        "Rate limit exceeded"
                    );
                    Ok(rate_limit_response(&state.describe(&rejection), retry_after))
                }
            }
        })
    }
}

/// Extract the client address a request is accounted against
pub fn extract_client_ip<B>(req: &Request<B>, trust_forwarded: bool) -> IpAddr {
    if trust_forwarded {
        // Take the first IP (original client)
        if let Some(forwarded) = req.headers().get("x-forwarded-for") {
            if let Ok(forwarded_str) = forwarded.to_str() {
                if let Some(first_ip) = forwarded_str.split(',').next() {
                    if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                        return ip;
                    }
                }
            }
        }

        if let Some(real_ip) = req.headers().get("x-real-ip") {
            if let Ok(real_ip_str) = real_ip.to_str() {
                if let Ok(ip) = real_ip_str.trim().parse::<IpAddr>() {
                    return ip;
                }
            }
        }
    }

    if let Some(connect_info) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return connect_info.0.ip();
    }

    // Default to localhost if we can't determine IP
    IpAddr::from([127, 0, 0, 1])
}

/// Create rate limit exceeded response
fn rate_limit_response(quota: &str, retry_after: Duration) -> Response {
    let mut response = ApiError::rate_limited(quota, retry_after).into_response();
    let secs = retry_after.as_millis().div_ceil(1000).max(1);
    if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
        response.headers_mut().insert("Retry-After", value);
    }
    response
}

/// Background task to clean up stale rate limit windows
pub async fn cleanup_task(state: Arc<RateLimitState>, interval: Duration, max_age: Duration) {
    let mut cleanup_interval = tokio::time::interval(interval);
    cleanup_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        cleanup_interval.tick().await;
        state.cleanup(max_age);
    }
}
