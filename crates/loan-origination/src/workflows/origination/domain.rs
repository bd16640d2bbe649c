use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for submitted loan applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for customers known to the customer directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable loan application as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub application_id: ApplicationId,
    pub customer_id: CustomerId,
    pub amount: f64,
    /// Requested term in months.
    pub term: u32,
    pub purpose: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_income: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_expenses: Option<f64>,
}

/// Customer record served by the customer directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerData {
    pub customer_id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub date_of_birth: NaiveDate,
    pub employment_status: String,
    pub annual_income: f64,
    pub monthly_expenses: f64,
    pub credit_score: u16,
    pub has_bankruptcy: bool,
    pub outstanding_loans: u32,
}

/// Outcome of the validation stage; errors are kept in the order they were found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn first_error(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreditRating {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl CreditRating {
    pub const fn from_score(score: u16) -> Self {
        match score {
            750.. => CreditRating::Excellent,
            700..=749 => CreditRating::Good,
            650..=699 => CreditRating::Fair,
            _ => CreditRating::Poor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditCheckResult {
    pub credit_score: u16,
    pub credit_rating: CreditRating,
    pub has_bankruptcy: bool,
    pub outstanding_loans: u32,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeVerificationResult {
    pub employment_verified: bool,
    pub verified_annual_income: f64,
    pub debt_to_income_ratio: f64,
    pub verification_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Always within `[0, 100]`; lower is better.
    pub risk_score: f64,
    pub max_loan_amount: f64,
    pub recommended_interest_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    Approved,
    Rejected,
}

impl LoanStatus {
    pub const fn from_approval(approved: bool) -> Self {
        if approved {
            LoanStatus::Approved
        } else {
            LoanStatus::Rejected
        }
    }
}

/// Prior loan outcome as kept by the loan-history store. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanHistoryRecord {
    pub loan_id: String,
    pub customer_id: CustomerId,
    pub amount: f64,
    pub term: u32,
    pub purpose: String,
    pub status: LoanStatus,
    pub application_date: NaiveDate,
    pub decision_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Business outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub application_id: ApplicationId,
    pub customer_id: CustomerId,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_loan_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    pub decision_date: NaiveDate,
    pub reason: String,
}

impl Decision {
    pub fn rejection(application: &Application, reason: impl Into<String>, on: NaiveDate) -> Self {
        Self {
            application_id: application.application_id.clone(),
            customer_id: application.customer_id.clone(),
            approved: false,
            max_loan_amount: None,
            interest_rate: None,
            decision_date: on,
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> LoanStatus {
        LoanStatus::from_approval(self.approved)
    }

    pub fn summary(&self) -> String {
        match (self.approved, self.interest_rate) {
            (true, Some(rate)) => format!("approved at {rate:.2}%: {}", self.reason),
            (true, None) => format!("approved: {}", self.reason),
            (false, _) => format!("declined: {}", self.reason),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Carries the business decision, approved or declined.
    Outcome,
    /// Generic processing error; no internal detail is exposed.
    ProcessingError,
}

/// Applicant-facing message dispatched once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub application_id: ApplicationId,
    pub customer_id: CustomerId,
    pub kind: NotificationKind,
    pub decision: Decision,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationReceipt {
    pub sent: bool,
    pub channel: NotificationChannel,
    pub timestamp: DateTime<Utc>,
}
