use chrono::NaiveDate;

use super::domain::{Application, Decision, Notification, NotificationKind};

/// Applicant-facing reason used whenever a run ends on a system fault.
pub const PROCESSING_ERROR_REASON: &str = "Application processing error occurred";

/// Notice carrying the business decision (approval or decline).
pub fn outcome_notification(application: &Application, decision: &Decision) -> Notification {
    let message = if decision.approved {
        format!(
            "Congratulations! Your loan application for ${} has been approved with an interest rate of {}%",
            application.amount,
            decision
                .interest_rate
                .map(|rate| rate.to_string())
                .unwrap_or_else(|| "n/a".to_string())
        )
    } else {
        format!(
            "We regret to inform you that your loan application has been declined. Reason: {}",
            decision.reason
        )
    };

    Notification {
        application_id: application.application_id.clone(),
        customer_id: application.customer_id.clone(),
        kind: NotificationKind::Outcome,
        decision: decision.clone(),
        message,
    }
}

/// Generic notice for runs that ended on a fault; internal detail stays in the logs.
pub fn processing_error_notification(application: &Application, on: NaiveDate) -> Notification {
    let decision = Decision::rejection(application, PROCESSING_ERROR_REASON, on);
    let message = format!(
        "We regret to inform you that your loan application has been declined. Reason: {}",
        decision.reason
    );

    Notification {
        application_id: application.application_id.clone(),
        customer_id: application.customer_id.clone(),
        kind: NotificationKind::ProcessingError,
        decision,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::origination::domain::{ApplicationId, CustomerId};

    fn application() -> Application {
        Application {
            application_id: ApplicationId("APP-77".to_string()),
            customer_id: CustomerId("CUST456".to_string()),
            amount: 25000.0,
            term: 36,
            purpose: "Home Improvement".to_string(),
            employment_status: None,
            annual_income: None,
            monthly_expenses: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 2).expect("valid date")
    }

    #[test]
    fn approved_message_includes_amount_and_rate() {
        let application = application();
        let decision = Decision {
            approved: true,
            interest_rate: Some(5.0),
            max_loan_amount: Some(30000.0),
            reason: "Low risk profile".to_string(),
            ..Decision::rejection(&application, "", date())
        };

        let notice = outcome_notification(&application, &decision);
        assert_eq!(notice.kind, NotificationKind::Outcome);
        assert_eq!(
            notice.message,
            "Congratulations! Your loan application for $25000 has been approved with an interest rate of 5%"
        );
    }

    #[test]
    fn processing_error_hides_internal_detail() {
        let notice = processing_error_notification(&application(), date());
        assert_eq!(notice.kind, NotificationKind::ProcessingError);
        assert!(!notice.decision.approved);
        assert_eq!(notice.decision.reason, PROCESSING_ERROR_REASON);
        assert!(notice.message.ends_with(PROCESSING_ERROR_REASON));
    }
}
