//! Alloy evaluation API client.
//!
//! `POST {evaluations_url}` with the submission as JSON body and HTTP Basic
//! auth. A created evaluation (201) yields the summary outcome and the
//! evaluation token; every other result is classified into a
//! [`ProviderError`] kind.

use crate::domain::config::{ProviderConfig, ProviderCredentials};
use crate::domain::{EvaluationResponse, ProviderError, ProviderOutcome, Submission};
use crate::ports::VerificationProvider;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{error, info};

/// Production [`VerificationProvider`] backed by `reqwest`
pub struct AlloyClient {
    client: Client,
    evaluations_url: String,
    credentials: ProviderCredentials,
    timeout: Duration,
}

impl AlloyClient {
    /// Build a client from provider configuration
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Unexpected(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            evaluations_url: config.evaluations_url.clone(),
            credentials: config.credentials.clone(),
            timeout: config.timeout,
        })
    }

    /// Endpoint this client posts to
    pub fn evaluations_url(&self) -> &str {
        &self.evaluations_url
    }

    fn classify(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            error!(timeout_ms = self.timeout.as_millis() as u64, "Request to Alloy timed out");
            ProviderError::Timeout(self.timeout)
        } else if e.is_connect() {
            error!(error = %e, "Connection error to Alloy API");
            ProviderError::Unavailable(e.to_string())
        } else {
            ProviderError::Unexpected(e.to_string())
        }
    }
}

#[async_trait]
impl VerificationProvider for AlloyClient {
    async fn create_evaluation(
        &self,
        submission: &Submission,
    ) -> Result<ProviderOutcome, ProviderError> {
        info!("Calling Alloy API");

        let response = self
            .client
            .post(&self.evaluations_url)
            .basic_auth(self.credentials.token(), Some(self.credentials.secret()))
            .json(submission)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        info!(status = status.as_u16(), "Alloy response");

        if status != StatusCode::CREATED {
            error!(status = status.as_u16(), "Alloy API error");
            return Err(ProviderError::Status(status));
        }

        let body: EvaluationResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(e)
            } else {
                ProviderError::Unexpected(format!("invalid evaluation response: {}", e))
            }
        })?;

        let outcome = ProviderOutcome::from(body);
        info!(outcome = %outcome.outcome, "Evaluation created");
        Ok(outcome)
    }
}
