use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::origination::{OriginationConfig, ValidationPolicy, DEFAULT_RUN_TIMEOUT};

const DEFAULT_EMPLOYMENT_VERIFICATION_RATE: f64 = 0.9;

/// Deployment tier the service is running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Settings assembled from the process environment (and `.env`, when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub origination: OriginationConfig,
    pub stages: StageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::parse(&var_or("APP_ENV", "development"));
        let server = ServerConfig {
            host: var_or("APP_HOST", "127.0.0.1"),
            port: var_or("APP_PORT", "3000")
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort)?,
        };
        let telemetry = TelemetryConfig {
            log_level: var_or("APP_LOG_LEVEL", "info"),
        };

        let run_timeout = match env::var("APP_RUN_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidRunTimeout)?,
            Err(_) => DEFAULT_RUN_TIMEOUT,
        };

        let employment_verification_rate = match env::var("APP_EMPLOYMENT_VERIFICATION_RATE") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|rate| (0.0..=1.0).contains(rate))
                .ok_or(ConfigError::InvalidVerificationRate)?,
            Err(_) => DEFAULT_EMPLOYMENT_VERIFICATION_RATE,
        };

        Ok(Self {
            environment,
            server,
            telemetry,
            origination: OriginationConfig {
                run_timeout,
                validation: ValidationPolicy::default(),
            },
            stages: StageConfig {
                employment_verification_rate,
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// HTTP listener binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::from([127, 0, 0, 1])
        } else {
            self.host.parse::<IpAddr>()?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

/// Knobs for the bundled credit and income stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageConfig {
    pub employment_verification_rate: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost(#[from] std::net::AddrParseError),
    #[error("APP_RUN_TIMEOUT_SECS must be a positive number of seconds")]
    InvalidRunTimeout,
    #[error("APP_EMPLOYMENT_VERIFICATION_RATE must be a probability between 0 and 1")]
    InvalidVerificationRate,
}
