use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::super::domain::{Application, Decision, LoanHistoryRecord, LoanStatus, RiskAssessment};

pub const LOW_RISK_REASON: &str = "Low risk profile";
pub const MEDIUM_RISK_REASON: &str = "Medium risk profile";
pub const GOOD_HISTORY_REASON: &str = "Higher risk but good history";
pub const DECLINE_REASON: &str = "High risk profile or poor loan history";

/// History facts the decision table looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySignals {
    pub has_defaulted_loans: bool,
    pub has_successful_loans: bool,
}

impl HistorySignals {
    pub fn from_history(history: &[LoanHistoryRecord]) -> Self {
        Self {
            has_defaulted_loans: history
                .iter()
                .any(|record| record.status == LoanStatus::Rejected),
            has_successful_loans: history
                .iter()
                .any(|record| record.status == LoanStatus::Approved),
        }
    }
}

/// Terms selected by the decision table, before they are bound to an application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionTerms {
    pub approved: bool,
    pub interest_rate: Option<f64>,
    pub max_loan_amount: Option<f64>,
    pub reason: &'static str,
}

/// Decision table over `(risk_score, history)`; total and deterministic.
pub fn decision_terms(risk_score: f64, signals: HistorySignals, amount: f64) -> DecisionTerms {
    if risk_score <= 50.0 {
        return DecisionTerms {
            approved: true,
            interest_rate: Some(5.0),
            max_loan_amount: Some(amount * 1.2),
            reason: LOW_RISK_REASON,
        };
    }

    if risk_score <= 70.0 && !signals.has_defaulted_loans {
        return DecisionTerms {
            approved: true,
            interest_rate: Some(8.0),
            max_loan_amount: Some(amount),
            reason: MEDIUM_RISK_REASON,
        };
    }

    if risk_score > 70.0
        && risk_score <= 85.0
        && signals.has_successful_loans
        && !signals.has_defaulted_loans
    {
        return DecisionTerms {
            approved: true,
            interest_rate: Some(12.0),
            max_loan_amount: Some(amount * 0.8),
            reason: GOOD_HISTORY_REASON,
        };
    }

    DecisionTerms {
        approved: false,
        interest_rate: None,
        max_loan_amount: None,
        reason: DECLINE_REASON,
    }
}

/// Produce the run's decision from the risk assessment and the customer's prior loans.
pub fn decide(
    application: &Application,
    risk: &RiskAssessment,
    history: &[LoanHistoryRecord],
    decision_date: NaiveDate,
) -> Decision {
    let signals = HistorySignals::from_history(history);
    let terms = decision_terms(risk.risk_score, signals, application.amount);

    Decision {
        application_id: application.application_id.clone(),
        customer_id: application.customer_id.clone(),
        approved: terms.approved,
        max_loan_amount: terms.max_loan_amount,
        interest_rate: terms.interest_rate,
        decision_date,
        reason: terms.reason.to_string(),
    }
}
