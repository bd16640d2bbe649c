use crate::infra::{build_engine, EngineWiring};
use clap::Args;
use loan_origination::config::AppConfig;
use loan_origination::error::AppError;
use loan_origination::workflows::origination::{
    Application, ApplicationId, CustomerId, OriginationReport, OutcomeView, SeededRandom,
    TerminalOutcome,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Application payload as JSON, e.g. '{"application_id":"APP-1","customer_id":"CUST456",...}'
    #[arg(long)]
    pub(crate) application: String,
    /// Seed employment verification so repeated runs agree
    #[arg(long, value_parser = crate::infra::parse_seed)]
    pub(crate) seed: Option<u64>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Seed employment verification so repeated runs agree
    #[arg(long, value_parser = crate::infra::parse_seed)]
    pub(crate) seed: Option<u64>,
    /// Simulated round trip for the credit and income stages, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub(crate) latency_ms: u64,
}

fn wiring(seed: Option<u64>, latency: Duration) -> EngineWiring {
    let mut wiring = EngineWiring {
        stage_latency: latency,
        ..EngineWiring::default()
    };
    if let Some(seed) = seed {
        wiring.random = Arc::new(SeededRandom::new(seed));
    }
    wiring
}

pub(crate) async fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let application: Application = serde_json::from_str(&args.application)?;
    let config = AppConfig::load()?;
    let engine = build_engine(&config, wiring(args.seed, Duration::ZERO));

    let report = engine.run(application).await?;
    let view = OutcomeView::from(&report);
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let engine = build_engine(
        &config,
        wiring(args.seed, Duration::from_millis(args.latency_ms)),
    );

    println!("Loan origination demo");
    println!(
        "Run budget: {}s, employment verification rate: {:.0}%",
        config.origination.run_timeout.as_secs(),
        config.stages.employment_verification_rate * 100.0
    );

    let results = engine.run_batch(sample_applications()).await;
    for result in results {
        let report = result?;
        render_report(&report);
    }

    Ok(())
}

fn render_report(report: &OriginationReport) {
    println!("\nApplication {}", report.application_id);
    let states: Vec<&str> = report.trace.iter().map(|state| state.label()).collect();
    println!("  Path: {}", states.join(" -> "));

    match &report.outcome {
        TerminalOutcome::Approved { decision } | TerminalOutcome::Rejected { decision } => {
            println!("  Decision: {}", decision.summary());
        }
        TerminalOutcome::Errored { fault } => {
            println!("  Fault: {fault}");
        }
    }

    if let Some(risk) = report.context.risk_assessment() {
        println!(
            "  Risk score: {:.1} (suggested rate {:.2}%, ceiling ${:.0})",
            risk.risk_score, risk.recommended_interest_rate, risk.max_loan_amount
        );
    }
    for event in &report.events {
        println!("  Event: {event:?}");
    }
    println!("  Notice: {}", report.notification.message);
}

fn sample_applications() -> Vec<Application> {
    let application = |id: &str, customer: &str, amount: f64, term: u32, purpose: &str| Application {
        application_id: ApplicationId(id.to_string()),
        customer_id: CustomerId(customer.to_string()),
        amount,
        term,
        purpose: purpose.to_string(),
        employment_status: None,
        annual_income: None,
        monthly_expenses: None,
    };

    vec![
        application("APP-DEMO-1", "CUST456", 25_000.0, 60, "Home Improvement"),
        application("APP-DEMO-2", "CUST789", 40_000.0, 120, "Debt Consolidation"),
        application("APP-DEMO-3", "CUST456", 2_000_000.0, 360, "Vacation Home"),
        application("APP-DEMO-4", "CUST000", 5_000.0, 12, "Car Repair"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use loan_origination::workflows::origination::{
        FixedClock, OriginationConfig, ValidationPolicy,
    };

    #[tokio::test]
    async fn sample_applications_cover_each_outcome() {
        let config = AppConfig {
            environment: loan_origination::config::AppEnvironment::Test,
            server: loan_origination::config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: loan_origination::config::TelemetryConfig {
                log_level: "info".to_string(),
            },
            origination: OriginationConfig {
                run_timeout: Duration::from_secs(30),
                validation: ValidationPolicy::default(),
            },
            stages: loan_origination::config::StageConfig {
                employment_verification_rate: 1.0,
            },
        };
        let instant = chrono::DateTime::parse_from_rfc3339("2025-04-02T10:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&chrono::Utc);
        let wiring = EngineWiring {
            clock: Arc::new(FixedClock(instant)),
            ..wiring(Some(11), Duration::ZERO)
        };
        let engine = build_engine(&config, wiring);

        let labels: Vec<&'static str> = engine
            .run_batch(sample_applications())
            .await
            .iter()
            .map(|result| result.as_ref().expect("notification sent").outcome.label())
            .collect();

        // CUST789 scores in the medium band but carries a rejected loan.
        assert_eq!(labels, vec!["approved", "rejected", "rejected", "errored"]);
    }
}
