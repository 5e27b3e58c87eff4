//! Wire types shared between the provider client and the HTTP handlers.

use serde::{Deserialize, Serialize};

/// Decision returned by the verification provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOutcome {
    /// Decision label, e.g. "Approved", "Denied", "Manual Review"
    pub outcome: String,
    /// Opaque reference to this evaluation on the provider side
    pub evaluation_token: Option<String>,
}

/// Body of a successful `POST /submit`
pub type SubmitResponse = ProviderOutcome;

/// Provider response body for a created evaluation.
///
/// Only the fields the gateway relays are modelled; the rest is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationResponse {
    pub summary: EvaluationSummary,
    #[serde(default)]
    pub evaluation_token: Option<String>,
}

/// `summary` object of an evaluation
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationSummary {
    pub outcome: String,
}

impl From<EvaluationResponse> for ProviderOutcome {
    fn from(resp: EvaluationResponse) -> Self {
        Self {
            outcome: resp.summary.outcome,
            evaluation_token: resp.evaluation_token,
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub metrics: serde_json::Value,
}
