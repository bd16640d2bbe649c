use serde::Serialize;

use super::contract::{StageFailure, StageResult};
use super::domain::{
    Application, CreditCheckResult, CustomerData, Decision, IncomeVerificationResult,
    LoanHistoryRecord, Notification, RiskAssessment, ValidationResult,
};

/// Error raised when a stage output would overwrite an existing context field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("context field `{0}` is already set for this run")]
pub struct ContextError(pub &'static str);

/// Field that may be written at most once per run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct WriteOnce<T> {
    value: Option<T>,
    #[serde(skip)]
    field: &'static str,
}

impl<T> WriteOnce<T> {
    const fn empty(field: &'static str) -> Self {
        Self { value: None, field }
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    fn set(&mut self, value: T) -> Result<&T, ContextError> {
        if self.value.is_some() {
            return Err(ContextError(self.field));
        }
        Ok(&*self.value.insert(value))
    }

    fn require(&self) -> StageResult<&T> {
        self.value
            .as_ref()
            .ok_or_else(|| StageFailure::contract_violation(self.field))
    }
}

/// Per-run accumulator of stage outputs, owned by exactly one pipeline run.
///
/// A field is present only once its producing stage has completed successfully.
#[derive(Debug, Clone, Serialize)]
pub struct Context {
    application: Application,
    customer_data: WriteOnce<CustomerData>,
    validation: WriteOnce<ValidationResult>,
    credit_check: WriteOnce<CreditCheckResult>,
    income_verification: WriteOnce<IncomeVerificationResult>,
    risk_assessment: WriteOnce<RiskAssessment>,
    loan_history: WriteOnce<Vec<LoanHistoryRecord>>,
    decision: WriteOnce<Decision>,
    notification: WriteOnce<Notification>,
}

impl Context {
    pub fn new(application: Application) -> Self {
        Self {
            application,
            customer_data: WriteOnce::empty("customer_data"),
            validation: WriteOnce::empty("validation"),
            credit_check: WriteOnce::empty("credit_check"),
            income_verification: WriteOnce::empty("income_verification"),
            risk_assessment: WriteOnce::empty("risk_assessment"),
            loan_history: WriteOnce::empty("loan_history"),
            decision: WriteOnce::empty("decision"),
            notification: WriteOnce::empty("notification"),
        }
    }

    pub fn application(&self) -> &Application {
        &self.application
    }

    pub fn customer_data(&self) -> Option<&CustomerData> {
        self.customer_data.get()
    }

    pub fn validation(&self) -> Option<&ValidationResult> {
        self.validation.get()
    }

    pub fn credit_check(&self) -> Option<&CreditCheckResult> {
        self.credit_check.get()
    }

    pub fn income_verification(&self) -> Option<&IncomeVerificationResult> {
        self.income_verification.get()
    }

    pub fn risk_assessment(&self) -> Option<&RiskAssessment> {
        self.risk_assessment.get()
    }

    pub fn loan_history(&self) -> Option<&[LoanHistoryRecord]> {
        self.loan_history.get().map(Vec::as_slice)
    }

    pub fn decision(&self) -> Option<&Decision> {
        self.decision.get()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.get()
    }

    pub(crate) fn record_customer_data(
        &mut self,
        value: CustomerData,
    ) -> Result<&CustomerData, ContextError> {
        self.customer_data.set(value)
    }

    pub(crate) fn record_validation(
        &mut self,
        value: ValidationResult,
    ) -> Result<&ValidationResult, ContextError> {
        self.validation.set(value)
    }

    /// Attach both parallel branch results at once; neither is kept if either slot is taken.
    pub(crate) fn record_checks(
        &mut self,
        credit: CreditCheckResult,
        income: IncomeVerificationResult,
    ) -> Result<(), ContextError> {
        if self.credit_check.is_set() {
            return Err(ContextError(self.credit_check.field));
        }
        if self.income_verification.is_set() {
            return Err(ContextError(self.income_verification.field));
        }
        self.credit_check.set(credit)?;
        self.income_verification.set(income)?;
        Ok(())
    }

    pub(crate) fn record_risk_assessment(
        &mut self,
        value: RiskAssessment,
    ) -> Result<&RiskAssessment, ContextError> {
        self.risk_assessment.set(value)
    }

    pub(crate) fn record_loan_history(
        &mut self,
        value: Vec<LoanHistoryRecord>,
    ) -> Result<&[LoanHistoryRecord], ContextError> {
        self.loan_history.set(value).map(Vec::as_slice)
    }

    pub(crate) fn record_decision(&mut self, value: Decision) -> Result<&Decision, ContextError> {
        self.decision.set(value)
    }

    pub(crate) fn record_notification(
        &mut self,
        value: Notification,
    ) -> Result<&Notification, ContextError> {
        self.notification.set(value)
    }

    pub(crate) fn require_credit_check(&self) -> StageResult<&CreditCheckResult> {
        self.credit_check.require()
    }

    pub(crate) fn require_income_verification(&self) -> StageResult<&IncomeVerificationResult> {
        self.income_verification.require()
    }

    pub(crate) fn require_risk_assessment(&self) -> StageResult<&RiskAssessment> {
        self.risk_assessment.require()
    }

    pub(crate) fn require_loan_history(&self) -> StageResult<&[LoanHistoryRecord]> {
        self.loan_history.require().map(Vec::as_slice)
    }

    pub(crate) fn require_decision(&self) -> StageResult<&Decision> {
        self.decision.require()
    }
}
