use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::super::contract::{StageFailure, StageResult};
use super::super::domain::{CustomerData, CustomerId, IncomeVerificationResult};
use super::super::ports::{Clock, RandomSource};

/// Employment and income verification seam.
#[async_trait]
pub trait IncomeVerifier: Send + Sync {
    async fn verify(
        &self,
        customer_id: &CustomerId,
        customer: Option<&CustomerData>,
    ) -> StageResult<IncomeVerificationResult>;
}

/// Verifier backed by the customer record, with employment confirmation drawn from a
/// random source so callers can pin the outcome.
pub struct EmploymentRecordVerifier {
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    verification_rate: f64,
    latency: Duration,
}

impl EmploymentRecordVerifier {
    pub fn new(
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        verification_rate: f64,
    ) -> Self {
        Self {
            clock,
            random,
            verification_rate: verification_rate.clamp(0.0, 1.0),
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl IncomeVerifier for EmploymentRecordVerifier {
    async fn verify(
        &self,
        customer_id: &CustomerId,
        customer: Option<&CustomerData>,
    ) -> StageResult<IncomeVerificationResult> {
        let customer = customer.ok_or_else(|| {
            StageFailure::missing_input(format!(
                "Customer data is required for income verification ({customer_id})"
            ))
        })?;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let employment_verified = self.random.chance(self.verification_rate);
        let verified_annual_income = customer.annual_income;
        let monthly_income = verified_annual_income / 12.0;

        Ok(IncomeVerificationResult {
            employment_verified,
            verified_annual_income,
            debt_to_income_ratio: customer.monthly_expenses / monthly_income,
            verification_date: self.clock.now(),
        })
    }
}
