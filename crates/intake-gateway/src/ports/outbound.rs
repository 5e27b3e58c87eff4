//! Outbound ports for the intake gateway.

use crate::domain::{ProviderError, ProviderOutcome, Submission};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Identity-verification provider.
///
/// One call per submission; implementations never retry.
#[async_trait]
pub trait VerificationProvider: Send + Sync {
    /// Create an evaluation for a validated submission
    async fn create_evaluation(
        &self,
        submission: &Submission,
    ) -> Result<ProviderOutcome, ProviderError>;
}

/// Date source for age checks
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Always returns the same date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
