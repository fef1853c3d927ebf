// Process runner configuration

use std::time::Duration;

/// Timing knobs for the process runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// How often the runner checks cancellation, timeout and exit
    pub poll_interval: Duration,
    /// Time between the graceful exit request and the forced kill
    pub grace_period: Duration,
    /// Upper bound on waiting for the output readers after exit
    pub reader_join_timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            grace_period: Duration::from_secs(2),
            reader_join_timeout: Duration::from_secs(2),
        }
    }
}
