use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::domain::{
    CustomerData, CustomerId, LoanHistoryRecord, Notification, NotificationReceipt,
};

/// Read access to customer records.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn customer(&self, customer_id: &CustomerId) -> Result<CustomerData, CollaboratorError>;
}

/// Error enumeration for customer directory lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    #[error("customer {0} not found")]
    NotFound(CustomerId),
    #[error("customer directory unavailable: {0}")]
    Unavailable(String),
}

/// Narrow read/append interface over the loan-history key-value store.
///
/// Consistency across concurrent writers for different customers is the store's concern;
/// the engine does not lock around these calls.
#[async_trait]
pub trait LoanHistoryStore: Send + Sync {
    async fn history(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<LoanHistoryRecord>, HistoryError>;

    async fn append(&self, record: LoanHistoryRecord) -> Result<(), HistoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("loan history store unavailable: {0}")]
    Unavailable(String),
    #[error("loan history write rejected: {0}")]
    Rejected(String),
}

/// Outbound applicant messaging (e-mail, SMS or both).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<NotificationReceipt, NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("notifier panicked: {0}")]
    Panicked(String),
}

/// Time source injected so runs are reproducible.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Source of randomness for simulated stage behavior.
pub trait RandomSource: Send + Sync {
    /// Returns a sample uniformly drawn from `[0, 1)`.
    fn unit(&self) -> f64;

    fn chance(&self, probability: f64) -> bool {
        self.unit() < probability
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn unit(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// Deterministic generator for reproducible runs.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn unit(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.random::<f64>(),
            Err(poisoned) => poisoned.into_inner().random::<f64>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_random_is_reproducible() {
        let first = SeededRandom::new(7);
        let second = SeededRandom::new(7);
        let a: Vec<f64> = (0..5).map(|_| first.unit()).collect();
        let b: Vec<f64> = (0..5).map(|_| second.unit()).collect();
        assert_eq!(a, b);
        assert!(a.iter().all(|value| (0.0..1.0).contains(value)));
    }

    #[test]
    fn fixed_clock_reports_its_date() {
        let instant = DateTime::parse_from_rfc3339("2025-03-14T09:30:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        let clock = FixedClock(instant);
        assert_eq!(
            clock.today(),
            NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date")
        );
    }
}
