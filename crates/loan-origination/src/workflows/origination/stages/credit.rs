use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::super::contract::{StageFailure, StageResult};
use super::super::domain::{CreditCheckResult, CreditRating, CustomerData, CustomerId};
use super::super::ports::Clock;

/// Credit bureau seam: pulls a credit profile for a customer.
#[async_trait]
pub trait CreditBureau: Send + Sync {
    async fn check(
        &self,
        customer_id: &CustomerId,
        customer: Option<&CustomerData>,
    ) -> StageResult<CreditCheckResult>;
}

/// Bureau that reports the credit profile already held on the customer record.
pub struct CustomerFileBureau {
    clock: Arc<dyn Clock>,
    latency: Duration,
}

impl CustomerFileBureau {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            latency: Duration::ZERO,
        }
    }

    /// Simulate a round trip to an external bureau.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl CreditBureau for CustomerFileBureau {
    async fn check(
        &self,
        customer_id: &CustomerId,
        customer: Option<&CustomerData>,
    ) -> StageResult<CreditCheckResult> {
        let customer = customer.ok_or_else(|| {
            StageFailure::missing_input(format!(
                "Customer data is required for credit check ({customer_id})"
            ))
        })?;

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        Ok(CreditCheckResult {
            credit_score: customer.credit_score,
            credit_rating: CreditRating::from_score(customer.credit_score),
            has_bankruptcy: customer.has_bankruptcy,
            outstanding_loans: customer.outstanding_loans,
            last_updated: self.clock.now(),
        })
    }
}
