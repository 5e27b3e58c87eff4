//! Gateway configuration with validation.
//!
//! Every section has working defaults. Secrets and deployment overrides come
//! from the process environment via [`GatewayConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use zeroize::Zeroizing;

/// Environment variable holding the provider workflow token
pub const ENV_WORKFLOW_TOKEN: &str = "WORKFLOW_TOKEN";
/// Environment variable holding the provider workflow secret
pub const ENV_WORKFLOW_SECRET: &str = "WORKFLOW_SECRET";
/// Optional bind host override
pub const ENV_HOST: &str = "INTAKE_HOST";
/// Optional bind port override
pub const ENV_PORT: &str = "INTAKE_PORT";
/// Optional provider endpoint override
pub const ENV_EVALUATIONS_URL: &str = "ALLOY_EVALUATIONS_URL";
/// Optional provider timeout override, in seconds
pub const ENV_TIMEOUT_SECS: &str = "ALLOY_TIMEOUT_SECS";

/// Alloy sandbox evaluation endpoint
pub const DEFAULT_EVALUATIONS_URL: &str = "https://sandbox.alloy.co/v1/evaluations/";

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Verification provider configuration
    pub provider: ProviderConfig,
}

impl GatewayConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration using `lookup` to resolve variable names
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnv(name))
        };
        config.provider.credentials = ProviderCredentials::new(
            required(ENV_WORKFLOW_TOKEN)?,
            required(ENV_WORKFLOW_SECRET)?,
        );

        if let Some(host) = lookup(ENV_HOST) {
            config.http.host = parse_env(ENV_HOST, &host)?;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.http.port = parse_env(ENV_PORT, &port)?;
        }
        if let Some(url) = lookup(ENV_EVALUATIONS_URL) {
            config.provider.evaluations_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            config.provider.timeout = Duration::from_secs(parse_env(ENV_TIMEOUT_SECS, &secs)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit.per_address_per_minute == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "per_address_per_minute cannot be 0".into(),
            ));
        }
        if self.rate_limit.global_per_hour == 0 {
            return Err(ConfigError::InvalidRateLimit(
                "global_per_hour cannot be 0".into(),
            ));
        }

        if self.http.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit("max_body_size cannot be 0".into()));
        }

        if self.provider.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "provider timeout cannot be 0".into(),
            ));
        }

        let url = &self.provider.evaluations_url;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Invalid(format!(
                "evaluations_url must be an http(s) URL, got '{}'",
                url
            )));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value: value.to_string(),
    })
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 5001)
    pub port: u16,
    /// Max request body size in bytes (default: 1MB)
    pub max_body_size: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5001,
            max_body_size: 1024 * 1024,
        }
    }
}

/// Rate limiting configuration for the submission route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting
    pub enabled: bool,
    /// Admitted requests per minute per client address
    pub per_address_per_minute: u32,
    /// Admitted requests per hour across all clients
    pub global_per_hour: u32,
    /// Addresses exempt from the per-address quota
    pub exempt: Vec<IpAddr>,
    /// Take the client address from X-Forwarded-For / X-Real-IP
    pub trust_forwarded_headers: bool,
    /// Per-address state idle longer than this is evicted
    #[serde(with = "humantime_serde")]
    pub eviction_age: Duration,
    /// How often eviction runs
    #[serde(with = "humantime_serde")]
    pub cleanup_interval: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            per_address_per_minute: 5,
            global_per_hour: 100,
            exempt: Vec::new(),
            trust_forwarded_headers: false,
            eviction_age: Duration::from_secs(600),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            allowed_methods: vec!["GET".to_string(), "POST".to_string(), "OPTIONS".to_string()],
            allowed_headers: vec!["Content-Type".to_string()],
        }
    }
}

/// Verification provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Evaluation-creation endpoint
    pub evaluations_url: String,
    /// Timeout for the whole outbound call
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Basic-auth credentials; only ever loaded from the environment
    #[serde(skip)]
    pub credentials: ProviderCredentials,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            evaluations_url: DEFAULT_EVALUATIONS_URL.to_string(),
            timeout: Duration::from_secs(30),
            credentials: ProviderCredentials::default(),
        }
    }
}

/// Service-account credentials for the provider (HTTP Basic)
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    token: Zeroizing<String>,
    secret: Zeroizing<String>,
}

impl ProviderCredentials {
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            token: Zeroizing::new(token.into()),
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Basic-auth user name
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Basic-auth password
    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty() || self.secret.is_empty()
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("token", &"<redacted>")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable not set or empty
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
    /// Environment variable could not be parsed
    #[error("invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },
    /// Invalid rate limiting configuration
    #[error("invalid rate limit: {0}")]
    InvalidRateLimit(String),
    /// Invalid size limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Duration (de)serialization as `30s` / `500ms` / `10m`
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
