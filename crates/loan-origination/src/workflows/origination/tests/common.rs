use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::workflows::origination::contract::{StageFailure, StageResult};
use crate::workflows::origination::domain::{
    Application, ApplicationId, CreditCheckResult, CustomerData, CustomerId,
    IncomeVerificationResult, LoanHistoryRecord, LoanStatus, Notification, NotificationChannel,
    NotificationReceipt,
};
use crate::workflows::origination::ports::{
    Clock, CollaboratorError, CustomerDirectory, FixedClock, HistoryError, LoanHistoryStore,
    NotificationError, Notifier,
};
use crate::workflows::origination::stages::{
    CreditBureau, CustomerFileBureau, EmploymentRecordVerifier, IncomeVerifier,
};
use crate::workflows::origination::{
    Collaborators, LoanOriginationEngine, OriginationConfig, SeededRandom,
};

pub(super) fn instant() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-04-02T10:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, 2).expect("valid date")
}

pub(super) fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(instant()))
}

pub(super) fn application() -> Application {
    Application {
        application_id: ApplicationId("APP-1001".to_string()),
        customer_id: CustomerId("CUST456".to_string()),
        amount: 25_000.0,
        term: 60,
        purpose: "Home Improvement".to_string(),
        employment_status: None,
        annual_income: None,
        monthly_expenses: None,
    }
}

/// Strong profile: risk score lands near 46 with verified employment.
pub(super) fn customer() -> CustomerData {
    CustomerData {
        customer_id: CustomerId("CUST456".to_string()),
        first_name: "Maya".to_string(),
        last_name: "Okafor".to_string(),
        email: "maya.okafor@example.com".to_string(),
        phone: "555-0134".to_string(),
        address: "12 Orchard Lane, Springfield".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1986, 7, 19).expect("valid date"),
        employment_status: "Employed".to_string(),
        annual_income: 85_000.0,
        monthly_expenses: 2_000.0,
        credit_score: 780,
        has_bankruptcy: false,
        outstanding_loans: 0,
    }
}

/// Weak profile: bankruptcy pushes the score to the ceiling.
pub(super) fn risky_customer() -> CustomerData {
    CustomerData {
        customer_id: CustomerId("CUST789".to_string()),
        first_name: "Dale".to_string(),
        last_name: "Rourke".to_string(),
        email: "dale.rourke@example.com".to_string(),
        credit_score: 600,
        has_bankruptcy: true,
        outstanding_loans: 2,
        ..customer()
    }
}

pub(super) fn application_for(customer_id: &str, application_id: &str) -> Application {
    Application {
        application_id: ApplicationId(application_id.to_string()),
        customer_id: CustomerId(customer_id.to_string()),
        ..application()
    }
}

pub(super) fn history_record(customer_id: &str, status: LoanStatus) -> LoanHistoryRecord {
    LoanHistoryRecord {
        loan_id: "LOAN-0001".to_string(),
        customer_id: CustomerId(customer_id.to_string()),
        amount: 10_000.0,
        term: 24,
        purpose: "Car Purchase".to_string(),
        status,
        application_date: NaiveDate::from_ymd_opt(2023, 2, 1).expect("valid date"),
        decision_date: NaiveDate::from_ymd_opt(2023, 2, 3).expect("valid date"),
        interest_rate: None,
        reason: None,
    }
}

pub(super) fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

/// Wiring shared by engine and routing tests; fields can be swapped before building.
pub(super) struct Fixture {
    pub(super) collaborators: Collaborators,
    pub(super) history: Arc<MemoryHistory>,
    pub(super) notifier: Arc<RecordingNotifier>,
}

impl Fixture {
    pub(super) fn engine(&self) -> LoanOriginationEngine {
        self.engine_with(OriginationConfig::default())
    }

    pub(super) fn engine_with(&self, config: OriginationConfig) -> LoanOriginationEngine {
        LoanOriginationEngine::new(self.collaborators.clone(), config)
    }
}

pub(super) fn fixture() -> Fixture {
    let clock = clock();
    let history = Arc::new(MemoryHistory::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let collaborators = Collaborators {
        customers: Arc::new(MemoryDirectory::with(vec![customer(), risky_customer()])),
        credit_bureau: Arc::new(CustomerFileBureau::new(clock.clone())),
        income_verifier: Arc::new(EmploymentRecordVerifier::new(
            clock.clone(),
            Arc::new(SeededRandom::new(7)),
            1.0,
        )),
        history: history.clone(),
        notifier: notifier.clone(),
        clock,
    };
    Fixture {
        collaborators,
        history,
        notifier,
    }
}

#[derive(Default)]
pub(super) struct MemoryDirectory {
    customers: HashMap<CustomerId, CustomerData>,
}

impl MemoryDirectory {
    pub(super) fn with(customers: Vec<CustomerData>) -> Self {
        Self {
            customers: customers
                .into_iter()
                .map(|customer| (customer.customer_id.clone(), customer))
                .collect(),
        }
    }
}

#[async_trait]
impl CustomerDirectory for MemoryDirectory {
    async fn customer(&self, customer_id: &CustomerId) -> Result<CustomerData, CollaboratorError> {
        self.customers
            .get(customer_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(customer_id.clone()))
    }
}

pub(super) struct UnavailableDirectory;

#[async_trait]
impl CustomerDirectory for UnavailableDirectory {
    async fn customer(&self, _customer_id: &CustomerId) -> Result<CustomerData, CollaboratorError> {
        Err(CollaboratorError::Unavailable("directory offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryHistory {
    records: Mutex<HashMap<CustomerId, Vec<LoanHistoryRecord>>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryHistory {
    pub(super) fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub(super) fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub(super) fn seed(&self, record: LoanHistoryRecord) {
        self.records
            .lock()
            .expect("history mutex poisoned")
            .entry(record.customer_id.clone())
            .or_default()
            .push(record);
    }

    pub(super) fn records_for(&self, customer_id: &str) -> Vec<LoanHistoryRecord> {
        self.records
            .lock()
            .expect("history mutex poisoned")
            .get(&CustomerId(customer_id.to_string()))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl LoanHistoryStore for MemoryHistory {
    async fn history(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<LoanHistoryRecord>, HistoryError> {
        if self.fail_reads {
            return Err(HistoryError::Unavailable("history table offline".to_string()));
        }
        Ok(self
            .records
            .lock()
            .expect("history mutex poisoned")
            .get(customer_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append(&self, record: LoanHistoryRecord) -> Result<(), HistoryError> {
        if self.fail_writes {
            return Err(HistoryError::Rejected("provisioned throughput exceeded".to_string()));
        }
        self.seed(record);
        Ok(())
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<NotificationReceipt, NotificationError> {
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification.clone());
        Ok(NotificationReceipt {
            sent: true,
            channel: NotificationChannel::Both,
            timestamp: instant(),
        })
    }
}

pub(super) struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(
        &self,
        _notification: &Notification,
    ) -> Result<NotificationReceipt, NotificationError> {
        Err(NotificationError::Transport("smtp relay refused connection".to_string()))
    }
}

pub(super) struct PanickingNotifier;

#[async_trait]
impl Notifier for PanickingNotifier {
    async fn send(
        &self,
        _notification: &Notification,
    ) -> Result<NotificationReceipt, NotificationError> {
        panic!("mail queue corrupted");
    }
}

/// Bureau that counts invocations before delegating to the customer file.
pub(super) struct SpyBureau {
    inner: CustomerFileBureau,
    calls: AtomicUsize,
}

impl SpyBureau {
    pub(super) fn new() -> Self {
        Self {
            inner: CustomerFileBureau::new(clock()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CreditBureau for SpyBureau {
    async fn check(
        &self,
        customer_id: &CustomerId,
        customer: Option<&CustomerData>,
    ) -> StageResult<CreditCheckResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.check(customer_id, customer).await
    }
}

pub(super) struct FailingBureau;

#[async_trait]
impl CreditBureau for FailingBureau {
    async fn check(
        &self,
        _customer_id: &CustomerId,
        _customer: Option<&CustomerData>,
    ) -> StageResult<CreditCheckResult> {
        Err(StageFailure::unavailable("credit bureau offline"))
    }
}

pub(super) struct PanickingBureau;

#[async_trait]
impl CreditBureau for PanickingBureau {
    async fn check(
        &self,
        _customer_id: &CustomerId,
        _customer: Option<&CustomerData>,
    ) -> StageResult<CreditCheckResult> {
        panic!("bureau exploded");
    }
}

/// Bureau that never answers inside any reasonable budget.
pub(super) struct StalledBureau;

#[async_trait]
impl CreditBureau for StalledBureau {
    async fn check(
        &self,
        _customer_id: &CustomerId,
        _customer: Option<&CustomerData>,
    ) -> StageResult<CreditCheckResult> {
        tokio::time::sleep(Duration::from_secs(60 * 60)).await;
        Err(StageFailure::unavailable("bureau answered too late"))
    }
}

pub(super) struct FailingVerifier;

#[async_trait]
impl IncomeVerifier for FailingVerifier {
    async fn verify(
        &self,
        _customer_id: &CustomerId,
        _customer: Option<&CustomerData>,
    ) -> StageResult<IncomeVerificationResult> {
        Err(StageFailure::unavailable("payroll provider timed out"))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
