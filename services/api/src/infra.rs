use async_trait::async_trait;
use chrono::NaiveDate;
use loan_origination::config::AppConfig;
use loan_origination::workflows::origination::{
    Clock, Collaborators, CollaboratorError, CustomerData, CustomerDirectory, CustomerFileBureau,
    CustomerId, EmploymentRecordVerifier, HistoryError, LoanHistoryRecord, LoanHistoryStore,
    LoanOriginationEngine, LoanStatus, Notification, NotificationChannel, NotificationError,
    NotificationReceipt, Notifier, RandomSource, SystemClock, ThreadRandom,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Options for wiring the bundled in-process collaborators.
#[derive(Clone)]
pub(crate) struct EngineWiring {
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) random: Arc<dyn RandomSource>,
    pub(crate) stage_latency: Duration,
}

impl Default for EngineWiring {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            random: Arc::new(ThreadRandom),
            stage_latency: Duration::ZERO,
        }
    }
}

/// Build an engine over seeded in-memory collaborators.
pub(crate) fn build_engine(config: &AppConfig, wiring: EngineWiring) -> LoanOriginationEngine {
    let EngineWiring {
        clock,
        random,
        stage_latency,
    } = wiring;

    let collaborators = Collaborators {
        customers: Arc::new(InMemoryCustomerDirectory::seeded()),
        credit_bureau: Arc::new(CustomerFileBureau::new(clock.clone()).with_latency(stage_latency)),
        income_verifier: Arc::new(
            EmploymentRecordVerifier::new(
                clock.clone(),
                random,
                config.stages.employment_verification_rate,
            )
            .with_latency(stage_latency),
        ),
        history: Arc::new(InMemoryLoanHistoryStore::seeded()),
        notifier: Arc::new(LoggingNotifier::new(clock.clone())),
        clock,
    };

    LoanOriginationEngine::new(collaborators, config.origination.clone())
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCustomerDirectory {
    customers: Arc<HashMap<CustomerId, CustomerData>>,
}

impl InMemoryCustomerDirectory {
    pub(crate) fn seeded() -> Self {
        let customers = sample_customers()
            .into_iter()
            .map(|customer| (customer.customer_id.clone(), customer))
            .collect();
        Self {
            customers: Arc::new(customers),
        }
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn customer(&self, customer_id: &CustomerId) -> Result<CustomerData, CollaboratorError> {
        self.customers
            .get(customer_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(customer_id.clone()))
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryLoanHistoryStore {
    records: Arc<Mutex<HashMap<CustomerId, Vec<LoanHistoryRecord>>>>,
}

impl InMemoryLoanHistoryStore {
    pub(crate) fn seeded() -> Self {
        let mut records: HashMap<CustomerId, Vec<LoanHistoryRecord>> = HashMap::new();
        for record in sample_history() {
            records
                .entry(record.customer_id.clone())
                .or_default()
                .push(record);
        }
        Self {
            records: Arc::new(Mutex::new(records)),
        }
    }
}

#[async_trait]
impl LoanHistoryStore for InMemoryLoanHistoryStore {
    async fn history(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Vec<LoanHistoryRecord>, HistoryError> {
        let guard = self
            .records
            .lock()
            .map_err(|_| HistoryError::Unavailable("history mutex poisoned".to_string()))?;
        Ok(guard.get(customer_id).cloned().unwrap_or_default())
    }

    async fn append(&self, record: LoanHistoryRecord) -> Result<(), HistoryError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| HistoryError::Unavailable("history mutex poisoned".to_string()))?;
        guard
            .entry(record.customer_id.clone())
            .or_default()
            .push(record);
        Ok(())
    }
}

/// Notifier that writes applicant messages to the log instead of a mail or SMS gateway.
pub(crate) struct LoggingNotifier {
    clock: Arc<dyn Clock>,
}

impl LoggingNotifier {
    pub(crate) fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<NotificationReceipt, NotificationError> {
        info!(
            application_id = %notification.application_id,
            customer_id = %notification.customer_id,
            kind = ?notification.kind,
            message = %notification.message,
            "applicant notification dispatched"
        );
        Ok(NotificationReceipt {
            sent: true,
            channel: NotificationChannel::Both,
            timestamp: self.clock.now(),
        })
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

pub(crate) fn sample_customers() -> Vec<CustomerData> {
    vec![
        CustomerData {
            customer_id: CustomerId("CUST456".to_string()),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            phone: "+1-555-123-4567".to_string(),
            address: "123 Main St, Anytown, USA".to_string(),
            date_of_birth: date(1980, 5, 15),
            employment_status: "Full-time".to_string(),
            annual_income: 120_000.0,
            monthly_expenses: 3_000.0,
            credit_score: 720,
            has_bankruptcy: false,
            outstanding_loans: 1,
        },
        CustomerData {
            customer_id: CustomerId("CUST789".to_string()),
            first_name: "Jane".to_string(),
            last_name: "Smith".to_string(),
            email: "jane.smith@example.com".to_string(),
            phone: "+1-555-987-6543".to_string(),
            address: "456 Oak Ave, Somewhere, USA".to_string(),
            date_of_birth: date(1975, 10, 22),
            employment_status: "Self-employed".to_string(),
            annual_income: 95_000.0,
            monthly_expenses: 2_500.0,
            credit_score: 680,
            has_bankruptcy: false,
            outstanding_loans: 2,
        },
    ]
}

pub(crate) fn sample_history() -> Vec<LoanHistoryRecord> {
    vec![
        LoanHistoryRecord {
            loan_id: "LOAN001".to_string(),
            customer_id: CustomerId("CUST456".to_string()),
            amount: 25_000.0,
            term: 24,
            purpose: "Car Purchase".to_string(),
            status: LoanStatus::Approved,
            application_date: date(2023, 1, 15),
            decision_date: date(2023, 1, 16),
            interest_rate: Some(4.5),
            reason: None,
        },
        LoanHistoryRecord {
            loan_id: "LOAN002".to_string(),
            customer_id: CustomerId("CUST789".to_string()),
            amount: 150_000.0,
            term: 360,
            purpose: "Home Purchase".to_string(),
            status: LoanStatus::Approved,
            application_date: date(2022, 6, 10),
            decision_date: date(2022, 6, 12),
            interest_rate: Some(3.75),
            reason: None,
        },
        LoanHistoryRecord {
            loan_id: "LOAN003".to_string(),
            customer_id: CustomerId("CUST789".to_string()),
            amount: 10_000.0,
            term: 12,
            purpose: "Home Improvement".to_string(),
            status: LoanStatus::Rejected,
            application_date: date(2023, 3, 5),
            decision_date: date(2023, 3, 6),
            interest_rate: None,
            reason: Some("Insufficient income".to_string()),
        },
    ]
}

pub(crate) fn parse_seed(raw: &str) -> Result<u64, String> {
    raw.trim()
        .parse::<u64>()
        .map_err(|err| format!("failed to parse '{raw}' as an unsigned seed ({err})"))
}
