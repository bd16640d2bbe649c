use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use futures::{FutureExt, TryFutureExt};
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Instrument};

use super::config::OriginationConfig;
use super::context::{Context, ContextError};
use super::contract::{PipelineState, StageErrorKind, StageFailure};
use super::domain::{
    Application, ApplicationId, CustomerId, Decision, LoanHistoryRecord, Notification,
    NotificationReceipt,
};
use super::notification::{outcome_notification, processing_error_notification};
use super::ports::{
    Clock, CollaboratorError, CustomerDirectory, LoanHistoryStore, NotificationError, Notifier,
};
use super::stages::{self, CreditBureau, IncomeVerifier};

/// Everything the engine calls out to, injected at construction.
#[derive(Clone)]
pub struct Collaborators {
    pub customers: Arc<dyn CustomerDirectory>,
    pub credit_bureau: Arc<dyn CreditBureau>,
    pub income_verifier: Arc<dyn IncomeVerifier>,
    pub history: Arc<dyn LoanHistoryStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

/// Fault that ends a run on the error-notification path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "fault", rename_all = "snake_case")]
pub enum RunFault {
    #[error("customer not found ({customer_id})")]
    CustomerNotFound { customer_id: CustomerId },
    #[error("{stage} failed: {message}")]
    StageFailed {
        stage: String,
        kind: StageErrorKind,
        message: String,
    },
    #[error("run exceeded its {budget_ms} ms budget")]
    Timeout { budget_ms: u64 },
    #[error("collaborator panicked: {message}")]
    Panicked { message: String },
}

impl RunFault {
    fn stage(stage: &str, failure: StageFailure) -> Self {
        RunFault::StageFailed {
            stage: stage.to_string(),
            kind: failure.kind,
            message: failure.message,
        }
    }
}

impl From<ContextError> for RunFault {
    fn from(value: ContextError) -> Self {
        RunFault::StageFailed {
            stage: "context".to_string(),
            kind: StageErrorKind::ContractViolation,
            message: value.to_string(),
        }
    }
}

/// Conditions handled inside the engine without ending the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    ValidationRejected { errors: Vec<String> },
    HistoryDegraded { message: String },
    HistoryWriteFailed { message: String },
}

/// Terminal outcome of one application run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TerminalOutcome {
    Approved { decision: Decision },
    Rejected { decision: Decision },
    Errored { fault: RunFault },
}

impl TerminalOutcome {
    pub const fn label(&self) -> &'static str {
        match self {
            TerminalOutcome::Approved { .. } => "approved",
            TerminalOutcome::Rejected { .. } => "rejected",
            TerminalOutcome::Errored { .. } => "errored",
        }
    }

    pub fn decision(&self) -> Option<&Decision> {
        match self {
            TerminalOutcome::Approved { decision } | TerminalOutcome::Rejected { decision } => {
                Some(decision)
            }
            TerminalOutcome::Errored { .. } => None,
        }
    }

    fn from_decision(decision: Decision) -> Self {
        if decision.approved {
            TerminalOutcome::Approved { decision }
        } else {
            TerminalOutcome::Rejected { decision }
        }
    }
}

/// Record of a completed run: the single notification it produced and how it got there.
#[derive(Debug, Clone, Serialize)]
pub struct OriginationReport {
    pub application_id: ApplicationId,
    pub outcome: TerminalOutcome,
    pub notification: Notification,
    pub receipt: NotificationReceipt,
    pub trace: Vec<PipelineState>,
    pub events: Vec<RunEvent>,
    pub context: Context,
}

/// Error raised by the engine; only notification delivery can fail a run upward.
#[derive(Debug, thiserror::Error)]
pub enum OriginationError {
    #[error("notification for application {application_id} could not be sent: {source}")]
    Notification {
        application_id: ApplicationId,
        outcome: Box<TerminalOutcome>,
        #[source]
        source: NotificationError,
    },
}

struct PipelineRun {
    context: Context,
    trace: Vec<PipelineState>,
    events: Vec<RunEvent>,
    started_on: NaiveDate,
}

/// Runs applications through the fixed origination pipeline.
pub struct LoanOriginationEngine {
    collaborators: Collaborators,
    config: OriginationConfig,
}

impl LoanOriginationEngine {
    pub fn new(collaborators: Collaborators, config: OriginationConfig) -> Self {
        Self {
            collaborators,
            config,
        }
    }

    /// Run one application to exactly one notification.
    pub async fn run(
        &self,
        application: Application,
    ) -> Result<OriginationReport, OriginationError> {
        let span = info_span!(
            "loan_origination",
            application_id = %application.application_id,
            customer_id = %application.customer_id,
        );
        self.run_pipeline(application).instrument(span).await
    }

    /// Run independent applications concurrently; results keep the input order.
    pub async fn run_batch(
        &self,
        applications: Vec<Application>,
    ) -> Vec<Result<OriginationReport, OriginationError>> {
        join_all(applications.into_iter().map(|application| self.run(application))).await
    }

    async fn run_pipeline(
        &self,
        application: Application,
    ) -> Result<OriginationReport, OriginationError> {
        let mut run = PipelineRun {
            context: Context::new(application),
            trace: Vec::new(),
            events: Vec::new(),
            started_on: self.collaborators.clock.today(),
        };

        let budget = self.config.run_timeout;
        let driven = tokio::time::timeout(
            budget,
            AssertUnwindSafe(self.drive(&mut run)).catch_unwind(),
        )
        .await;

        let fault = match driven {
            Ok(Ok(Ok(()))) => None,
            Ok(Ok(Err(fault))) => Some(fault),
            Ok(Err(panic)) => Some(RunFault::Panicked {
                message: panic_message(panic.as_ref()),
            }),
            Err(_) => Some(RunFault::Timeout {
                budget_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        self.notify(run, fault).await
    }

    async fn drive(&self, run: &mut PipelineRun) -> Result<(), RunFault> {
        let mut state = PipelineState::FetchCustomerData;
        while !state.is_terminal() {
            debug!(state = state.label(), "entering state");
            run.trace.push(state);
            state = self.step(state, run).await?;
        }
        Ok(())
    }

    async fn step(
        &self,
        state: PipelineState,
        run: &mut PipelineRun,
    ) -> Result<PipelineState, RunFault> {
        match state {
            PipelineState::FetchCustomerData => self.fetch_customer_data(run).await,
            PipelineState::Validate => self.validate(run),
            PipelineState::ParallelChecks => self.parallel_checks(run).await,
            PipelineState::RiskAssessment => self.assess_risk(run),
            PipelineState::RetrieveLoanHistory => self.retrieve_loan_history(run).await,
            PipelineState::LoanDecision => self.decide(run),
            PipelineState::UpdateLoanHistory => self.update_loan_history(run).await,
            PipelineState::NotifySuccess | PipelineState::NotifyError => Ok(state),
        }
    }

    async fn fetch_customer_data(
        &self,
        run: &mut PipelineRun,
    ) -> Result<PipelineState, RunFault> {
        let customer_id = run.context.application().customer_id.clone();
        match self.collaborators.customers.customer(&customer_id).await {
            Ok(customer) => {
                run.context.record_customer_data(customer)?;
                Ok(PipelineState::Validate)
            }
            Err(CollaboratorError::NotFound(customer_id)) => {
                Err(RunFault::CustomerNotFound { customer_id })
            }
            Err(err @ CollaboratorError::Unavailable(_)) => Err(RunFault::stage(
                PipelineState::FetchCustomerData.label(),
                StageFailure::unavailable(err.to_string()),
            )),
        }
    }

    fn validate(&self, run: &mut PipelineRun) -> Result<PipelineState, RunFault> {
        let result = stages::validate(
            run.context.application(),
            run.context.customer_data(),
            &self.config.validation,
        );
        let validation = run.context.record_validation(result)?.clone();

        let Some(reason) = validation.first_error() else {
            return Ok(PipelineState::ParallelChecks);
        };

        info!(
            reason,
            error_count = validation.errors.len(),
            "application rejected by validation"
        );
        let decision = Decision::rejection(
            run.context.application(),
            reason,
            self.collaborators.clock.today(),
        );
        run.context.record_decision(decision)?;
        run.events.push(RunEvent::ValidationRejected {
            errors: validation.errors,
        });
        Ok(PipelineState::NotifySuccess)
    }

    async fn parallel_checks(&self, run: &mut PipelineRun) -> Result<PipelineState, RunFault> {
        let (credit, income) = {
            let customer_id = &run.context.application().customer_id;
            let customer = run.context.customer_data();

            let credit = self
                .collaborators
                .credit_bureau
                .check(customer_id, customer)
                .map_err(|failure| RunFault::stage("credit_check", failure));
            let income = self
                .collaborators
                .income_verifier
                .verify(customer_id, customer)
                .map_err(|failure| RunFault::stage("income_verification", failure));

            tokio::try_join!(credit, income)?
        };

        debug!(
            credit_score = credit.credit_score,
            employment_verified = income.employment_verified,
            "parallel checks joined"
        );
        run.context.record_checks(credit, income)?;
        Ok(PipelineState::RiskAssessment)
    }

    fn assess_risk(&self, run: &mut PipelineRun) -> Result<PipelineState, RunFault> {
        let stage = PipelineState::RiskAssessment.label();
        let assessment = {
            let credit = run
                .context
                .require_credit_check()
                .map_err(|failure| RunFault::stage(stage, failure))?;
            let income = run
                .context
                .require_income_verification()
                .map_err(|failure| RunFault::stage(stage, failure))?;
            stages::assess_risk(run.context.application(), credit, income)
        };

        debug!(risk_score = assessment.risk_score, "risk assessed");
        run.context.record_risk_assessment(assessment)?;
        Ok(PipelineState::RetrieveLoanHistory)
    }

    async fn retrieve_loan_history(
        &self,
        run: &mut PipelineRun,
    ) -> Result<PipelineState, RunFault> {
        let customer_id = run.context.application().customer_id.clone();
        let history = match self.collaborators.history.history(&customer_id).await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "loan history unavailable; deciding without it");
                run.events.push(RunEvent::HistoryDegraded {
                    message: err.to_string(),
                });
                Vec::new()
            }
        };

        run.context.record_loan_history(history)?;
        Ok(PipelineState::LoanDecision)
    }

    fn decide(&self, run: &mut PipelineRun) -> Result<PipelineState, RunFault> {
        let stage = PipelineState::LoanDecision.label();
        let decision = {
            let risk = run
                .context
                .require_risk_assessment()
                .map_err(|failure| RunFault::stage(stage, failure))?;
            let history = run
                .context
                .require_loan_history()
                .map_err(|failure| RunFault::stage(stage, failure))?;
            stages::decide(
                run.context.application(),
                risk,
                history,
                self.collaborators.clock.today(),
            )
        };

        info!(
            approved = decision.approved,
            reason = %decision.reason,
            "loan decision made"
        );
        run.context.record_decision(decision)?;
        Ok(PipelineState::UpdateLoanHistory)
    }

    async fn update_loan_history(
        &self,
        run: &mut PipelineRun,
    ) -> Result<PipelineState, RunFault> {
        let record = {
            let decision = run
                .context
                .require_decision()
                .map_err(|failure| {
                    RunFault::stage(PipelineState::UpdateLoanHistory.label(), failure)
                })?;
            history_record(run.context.application(), decision, run.started_on)
        };

        if let Err(err) = self.collaborators.history.append(record).await {
            warn!(error = %err, "loan history update failed; notifying applicant anyway");
            run.events.push(RunEvent::HistoryWriteFailed {
                message: err.to_string(),
            });
        }

        Ok(PipelineState::NotifySuccess)
    }

    async fn notify(
        &self,
        mut run: PipelineRun,
        fault: Option<RunFault>,
    ) -> Result<OriginationReport, OriginationError> {
        let application = run.context.application().clone();

        // A clean drive must have produced a decision; a missing one is a contract violation.
        let (state, notification, outcome) = match (fault, run.context.decision().cloned()) {
            (None, Some(decision)) => (
                PipelineState::NotifySuccess,
                outcome_notification(&application, &decision),
                TerminalOutcome::from_decision(decision),
            ),
            (fault, _) => {
                let fault = fault.unwrap_or_else(|| {
                    RunFault::stage(
                        PipelineState::NotifySuccess.label(),
                        StageFailure::contract_violation("decision"),
                    )
                });
                error!(error = %fault, "application processing failed");
                (
                    PipelineState::NotifyError,
                    processing_error_notification(&application, self.collaborators.clock.today()),
                    TerminalOutcome::Errored { fault },
                )
            }
        };

        run.trace.push(state);
        let sent = AssertUnwindSafe(self.collaborators.notifier.send(&notification))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(NotificationError::Panicked(panic_message(panic.as_ref())))
            });
        let receipt = match sent {
            Ok(receipt) => receipt,
            Err(source) => {
                error!(error = %source, outcome = outcome.label(), "notification delivery failed");
                return Err(OriginationError::Notification {
                    application_id: application.application_id,
                    outcome: Box::new(outcome),
                    source,
                });
            }
        };
        if let Err(err) = run.context.record_notification(notification.clone()) {
            warn!(error = %err, "notification already recorded for this run");
        }

        info!(outcome = outcome.label(), channel = ?receipt.channel, "applicant notified");

        Ok(OriginationReport {
            application_id: application.application_id,
            outcome,
            notification,
            receipt,
            trace: run.trace,
            events: run.events,
            context: run.context,
        })
    }
}

fn history_record(
    application: &Application,
    decision: &Decision,
    application_date: NaiveDate,
) -> LoanHistoryRecord {
    LoanHistoryRecord {
        loan_id: application.application_id.0.clone(),
        customer_id: application.customer_id.clone(),
        amount: application.amount,
        term: application.term,
        purpose: application.purpose.clone(),
        status: decision.status(),
        application_date,
        decision_date: decision.decision_date,
        interest_rate: decision.interest_rate,
        reason: Some(decision.reason.clone()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
