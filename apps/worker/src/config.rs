//! Worker configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use postline_core::publication::WorkerConfig;

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub worker: WorkerConfig,
    /// Run one tick before waiting for the first interval.
    pub run_on_start: bool,
}

impl WorkerSettings {
    pub fn from_env() -> Self {
        let defaults = WorkerConfig::default();

        Self {
            worker: WorkerConfig {
                interval: env::var("WORKER_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|secs: &u64| *secs > 0)
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.interval),
                max_attempts: env::var("PUBLISH_MAX_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.max_attempts),
            },
            run_on_start: env::var("WORKER_RUN_ON_START")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}
