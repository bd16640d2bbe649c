use super::super::domain::{
    Application, CreditCheckResult, IncomeVerificationResult, RiskAssessment,
};

const BASE_RISK: f64 = 50.0;
const CREDIT_PIVOT: f64 = 600.0;
const BANKRUPTCY_PENALTY: f64 = 40.0;
const OUTSTANDING_LOAN_PENALTY: f64 = 5.0;
const UNVERIFIED_EMPLOYMENT_PENALTY: f64 = 10.0;
const INCOME_MONTHS_FINANCED: f64 = 36.0;
const BASE_RATE: f64 = 5.0;
const MAX_RISK_PREMIUM: f64 = 15.0;

/// Score an application from the joined credit and income results.
///
/// Scores are clamped to `[0, 100]`; a score that cannot be computed (for example zero
/// verified income with zero expenses) is treated as maximum risk.
pub fn assess_risk(
    application: &Application,
    credit: &CreditCheckResult,
    income: &IncomeVerificationResult,
) -> RiskAssessment {
    let monthly_income = income.verified_annual_income / 12.0;
    let debt_to_income = application
        .monthly_expenses
        .map(|expenses| expenses / monthly_income)
        .unwrap_or(income.debt_to_income_ratio);

    let mut score = BASE_RISK;
    score -= (credit.credit_score as f64 - CREDIT_PIVOT) / 10.0;
    score += debt_to_income * 50.0;
    if credit.has_bankruptcy {
        score += BANKRUPTCY_PENALTY;
    }
    score += credit.outstanding_loans as f64 * OUTSTANDING_LOAN_PENALTY;
    if !income.employment_verified {
        score += UNVERIFIED_EMPLOYMENT_PENALTY;
    }

    let risk_score = clamp_score(score);

    RiskAssessment {
        risk_score,
        max_loan_amount: max_loan_amount(monthly_income, risk_score),
        recommended_interest_rate: interest_rate(risk_score),
    }
}

pub(crate) fn clamp_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return 100.0;
    }
    raw.clamp(0.0, 100.0)
}

fn max_loan_amount(monthly_income: f64, risk_score: f64) -> f64 {
    let base = monthly_income * INCOME_MONTHS_FINANCED;
    let amount = (base * (100.0 - risk_score) / 100.0).round();
    if amount.is_finite() {
        amount.max(0.0)
    } else {
        0.0
    }
}

fn interest_rate(risk_score: f64) -> f64 {
    let rate = BASE_RATE + (risk_score / 100.0) * MAX_RISK_PREMIUM;
    (rate * 100.0).round() / 100.0
}
