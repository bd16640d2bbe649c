use std::time::Duration;

use super::stages::ValidationPolicy;

/// Whole-run wall clock budget.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Engine configuration; the pipeline topology itself is fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct OriginationConfig {
    pub run_timeout: Duration,
    pub validation: ValidationPolicy,
}

impl Default for OriginationConfig {
    fn default() -> Self {
        Self {
            run_timeout: DEFAULT_RUN_TIMEOUT,
            validation: ValidationPolicy::default(),
        }
    }
}
