use serde::{Deserialize, Serialize};

/// Classification of a failed stage invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageErrorKind {
    /// A required input (for example customer data) was not supplied.
    MissingInput,
    UpstreamUnavailable,
    /// An upstream context field a stage depends on was absent.
    ContractViolation,
}

/// Typed failure returned by a stage instead of a bare value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct StageFailure {
    pub kind: StageErrorKind,
    pub message: String,
}

impl StageFailure {
    pub fn new(kind: StageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::new(StageErrorKind::MissingInput, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StageErrorKind::UpstreamUnavailable, message)
    }

    pub fn contract_violation(field: &'static str) -> Self {
        Self::new(
            StageErrorKind::ContractViolation,
            format!("required context field `{field}` has not been produced"),
        )
    }
}

/// Either the stage's typed output or its typed failure.
pub type StageResult<T> = Result<T, StageFailure>;

/// States of the origination pipeline, in the order a successful run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    FetchCustomerData,
    Validate,
    ParallelChecks,
    RiskAssessment,
    RetrieveLoanHistory,
    LoanDecision,
    UpdateLoanHistory,
    NotifySuccess,
    NotifyError,
}

impl PipelineState {
    pub const fn label(self) -> &'static str {
        match self {
            PipelineState::FetchCustomerData => "fetch_customer_data",
            PipelineState::Validate => "validate",
            PipelineState::ParallelChecks => "parallel_checks",
            PipelineState::RiskAssessment => "risk_assessment",
            PipelineState::RetrieveLoanHistory => "retrieve_loan_history",
            PipelineState::LoanDecision => "loan_decision",
            PipelineState::UpdateLoanHistory => "update_loan_history",
            PipelineState::NotifySuccess => "notify_success",
            PipelineState::NotifyError => "notify_error",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, PipelineState::NotifySuccess | PipelineState::NotifyError)
    }
}
