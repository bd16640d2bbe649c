//! Loan origination pipeline.
//!
//! An application moves through a fixed state machine: customer lookup, validation, a
//! concurrent credit and income check, risk scoring, history-aware decisioning, a
//! best-effort history write and finally exactly one applicant notification. Every
//! failure path converges on the error notification so no run ends silently.

pub mod config;
pub mod context;
pub mod contract;
pub mod domain;
pub mod engine;
pub mod notification;
pub mod ports;
pub mod router;
pub mod stages;

#[cfg(test)]
mod tests;

pub use config::{OriginationConfig, DEFAULT_RUN_TIMEOUT};
pub use context::{Context, ContextError};
pub use contract::{PipelineState, StageErrorKind, StageFailure, StageResult};
pub use domain::{
    Application, ApplicationId, CreditCheckResult, CreditRating, CustomerData, CustomerId,
    Decision, IncomeVerificationResult, LoanHistoryRecord, LoanStatus, Notification,
    NotificationChannel, NotificationKind, NotificationReceipt, RiskAssessment,
    ValidationResult,
};
pub use engine::{
    Collaborators, LoanOriginationEngine, OriginationError, OriginationReport, RunEvent,
    RunFault, TerminalOutcome,
};
pub use notification::PROCESSING_ERROR_REASON;
pub use ports::{
    Clock, CollaboratorError, CustomerDirectory, FixedClock, HistoryError, LoanHistoryStore,
    NotificationError, Notifier, RandomSource, SeededRandom, SystemClock, ThreadRandom,
};
pub use router::{application_router, OutcomeView};
pub use stages::{
    CreditBureau, CustomerFileBureau, EmploymentRecordVerifier, IncomeVerifier,
    ValidationPolicy,
};
