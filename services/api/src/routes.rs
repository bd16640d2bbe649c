use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use loan_origination::workflows::origination::{application_router, LoanOriginationEngine};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_application_routes(engine: Arc<LoanOriginationEngine>) -> axum::Router {
    application_router(engine)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{build_engine, EngineWiring};
    use loan_origination::config::{
        AppConfig, AppEnvironment, ServerConfig, StageConfig, TelemetryConfig,
    };
    use loan_origination::workflows::origination::{OriginationConfig, SeededRandom};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn config() -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetryConfig {
                log_level: "info".to_string(),
            },
            origination: OriginationConfig::default(),
            stages: StageConfig {
                employment_verification_rate: 1.0,
            },
        }
    }

    fn state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn router(ready: bool) -> axum::Router {
        let wiring = EngineWiring {
            random: Arc::new(SeededRandom::new(5)),
            ..EngineWiring::default()
        };
        let engine = Arc::new(build_engine(&config(), wiring));
        with_application_routes(engine).layer(Extension(state(ready)))
    }

    async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn readiness_reports_initializing_until_bound() {
        let response = router(false)
            .oneshot(
                axum::http::Request::get("/ready")
                    .body(axum::body::Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(read_json_body(response).await["status"], "initializing");
    }

    #[tokio::test]
    async fn health_and_readiness_when_serving() {
        let health = router(true)
            .oneshot(
                axum::http::Request::get("/health")
                    .body(axum::body::Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(health.status(), StatusCode::OK);

        let ready = router(true)
            .oneshot(
                axum::http::Request::get("/ready")
                    .body(axum::body::Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(ready.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn application_route_uses_seeded_customers() {
        let payload = json!({
            "application_id": "APP-5005",
            "customer_id": "CUST456",
            "amount": 25_000.0,
            "term": 60,
            "purpose": "Home Improvement",
        });

        let response = router(true)
            .oneshot(
                axum::http::Request::post("/api/v1/loans/applications")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(axum::body::Body::from(payload.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json_body(response).await;
        assert_eq!(body["outcome"], "approved");
        assert_eq!(body["interest_rate"], 8.0);
        assert_eq!(body["max_loan_amount"], 25_000.0);
    }
}
