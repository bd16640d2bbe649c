use serde::{Deserialize, Serialize};

use super::super::domain::{Application, CustomerData, ValidationResult};

/// Fixed intake limits applied by the validation stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    pub max_amount: f64,
    pub max_term_months: u32,
    pub max_debt_to_income: f64,
    /// Annual rate used to amortize the requested loan for the affordability check.
    pub reference_annual_rate: f64,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_amount: 1_000_000.0,
            max_term_months: 360,
            max_debt_to_income: 0.43,
            reference_annual_rate: 0.05,
        }
    }
}

/// Check an application, accumulating every failing rule in discovery order.
pub fn validate(
    application: &Application,
    customer: Option<&CustomerData>,
    policy: &ValidationPolicy,
) -> ValidationResult {
    let mut errors = Vec::new();

    if application.application_id.0.trim().is_empty() {
        errors.push("Application ID is required".to_string());
    }

    if application.customer_id.0.trim().is_empty() {
        errors.push("Customer ID is required".to_string());
    }

    let amount = application.amount;
    if amount.is_nan() || amount <= 0.0 {
        errors.push("Loan amount must be greater than zero".to_string());
    } else if amount > policy.max_amount {
        errors.push(format!(
            "Loan amount exceeds maximum limit of ${}",
            thousands(policy.max_amount)
        ));
    }

    if application.term == 0 {
        errors.push("Loan term must be greater than zero".to_string());
    } else if application.term > policy.max_term_months {
        errors.push(format!(
            "Loan term cannot exceed {} months ({} years)",
            policy.max_term_months,
            policy.max_term_months / 12
        ));
    }

    if application.purpose.trim().is_empty() {
        errors.push("Loan purpose is required".to_string());
    }

    if let Some(customer) = customer {
        if customer.customer_id.0.trim().is_empty() {
            errors.push("Customer data is invalid".to_string());
        }

        // Amortization is undefined without a positive amount and term; those are reported above.
        if amount.is_finite() && amount > 0.0 && application.term > 0 {
            let payment = monthly_payment(amount, application.term, policy.reference_annual_rate);
            let monthly_income = customer.annual_income / 12.0;
            let ratio = (payment + customer.monthly_expenses) / monthly_income;
            if ratio > policy.max_debt_to_income {
                errors.push(format!(
                    "Debt-to-income ratio exceeds maximum allowed ({:.0}%)",
                    policy.max_debt_to_income * 100.0
                ));
            }
        }
    }

    ValidationResult::from_errors(errors)
}

/// Standard annuity payment for `principal` over `term` months.
pub fn monthly_payment(principal: f64, term: u32, annual_rate: f64) -> f64 {
    let monthly_rate = annual_rate / 12.0;
    let periods = term as f64;

    if monthly_rate == 0.0 {
        return principal / periods;
    }

    let growth = (1.0 + monthly_rate).powf(periods);
    principal * (monthly_rate * growth) / (growth - 1.0)
}

fn thousands(value: f64) -> String {
    let digits = format!("{:.0}", value);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
