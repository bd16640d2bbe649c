//! Evaluation stages run by the origination engine.
//!
//! Validation, risk assessment and the decision table are pure functions. Credit check
//! and income verification sit behind async traits because production deployments call
//! out to external bureaus for them.

mod credit;
mod decision;
mod income;
mod risk;
mod validation;

pub use credit::{CreditBureau, CustomerFileBureau};
pub use decision::{
    decide, decision_terms, DecisionTerms, HistorySignals, DECLINE_REASON, GOOD_HISTORY_REASON,
    LOW_RISK_REASON, MEDIUM_RISK_REASON,
};
pub use income::{EmploymentRecordVerifier, IncomeVerifier};
pub use risk::assess_risk;
pub use validation::{monthly_payment, validate, ValidationPolicy};
