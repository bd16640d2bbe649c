use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Serialize;
use serde_json::json;

use super::contract::PipelineState;
use super::domain::{Application, ApplicationId, NotificationKind};
use super::engine::{LoanOriginationEngine, OriginationError, OriginationReport, RunEvent};

/// Summary returned to API callers; fault detail stays in the engine logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeView {
    pub application_id: ApplicationId,
    pub outcome: &'static str,
    pub approved: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_loan_amount: Option<f64>,
    pub notification_kind: NotificationKind,
    pub trace: Vec<PipelineState>,
    pub events: Vec<RunEvent>,
}

impl From<&OriginationReport> for OutcomeView {
    fn from(report: &OriginationReport) -> Self {
        let decision = &report.notification.decision;
        Self {
            application_id: report.application_id.clone(),
            outcome: report.outcome.label(),
            approved: decision.approved,
            reason: decision.reason.clone(),
            interest_rate: decision.interest_rate,
            max_loan_amount: decision.max_loan_amount,
            notification_kind: report.notification.kind,
            trace: report.trace.clone(),
            events: report.events.clone(),
        }
    }
}

/// Router builder exposing the origination endpoints.
pub fn application_router(engine: Arc<LoanOriginationEngine>) -> Router {
    Router::new()
        .route("/api/v1/loans/applications", post(submit_handler))
        .route("/api/v1/loans/applications/batch", post(batch_handler))
        .with_state(engine)
}

pub(crate) async fn submit_handler(
    State(engine): State<Arc<LoanOriginationEngine>>,
    axum::Json(application): axum::Json<Application>,
) -> Response {
    match engine.run(application).await {
        Ok(report) => (StatusCode::OK, axum::Json(OutcomeView::from(&report))).into_response(),
        Err(error) => notification_failure(&error),
    }
}

pub(crate) async fn batch_handler(
    State(engine): State<Arc<LoanOriginationEngine>>,
    axum::Json(applications): axum::Json<Vec<Application>>,
) -> Response {
    let results = engine.run_batch(applications).await;
    let payload: Vec<serde_json::Value> = results
        .iter()
        .map(|result| match result {
            Ok(report) => json!(OutcomeView::from(report)),
            Err(error) => error_payload(error),
        })
        .collect();
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn error_payload(error: &OriginationError) -> serde_json::Value {
    let OriginationError::Notification { application_id, .. } = error;
    json!({
        "application_id": application_id,
        "error": error.to_string(),
    })
}

fn notification_failure(error: &OriginationError) -> Response {
    (StatusCode::BAD_GATEWAY, axum::Json(error_payload(error))).into_response()
}
