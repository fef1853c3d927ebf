// Config module - tool records and orchestrator settings

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::load_tools_file;
pub use types::{ArgsTemplate, Phase, PhaseTemplates, ToolConfig, ToolsFile};

use crate::process::RunnerConfig;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Orchestrator-wide settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Path to the tools file (TOML, or JSON by extension)
    pub tools_file: PathBuf,
    /// Root for `{temp_dir}`, staging directories and the probe input
    pub temp_root: PathBuf,
    /// Root for `{report_dir}` and diff sidecars
    pub report_root: PathBuf,
    /// Timeout for probes
    pub probe_timeout: Duration,
    /// Timeout for run/plan/execute
    pub run_timeout: Duration,
    /// Process runner timing
    pub runner: RunnerConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        let base = dirs::home_dir()
            .map(|p| p.join(".toolgate"))
            .unwrap_or_else(|| PathBuf::from(".toolgate"));
        Self {
            tools_file: base.join("tools.toml"),
            temp_root: base.join("tmp"),
            report_root: base.join("reports"),
            probe_timeout: Duration::from_secs(10),
            run_timeout: Duration::from_secs(6 * 60 * 60),
            runner: RunnerConfig::default(),
        }
    }
}

/// Parse an environment variable, logging a warning if the value is present but invalid.
fn parse_env_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(v) => match v.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(var = name, value = %v, "Invalid env var value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_path(name: &str, default: PathBuf) -> PathBuf {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

impl OrchestratorConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = OrchestratorConfig::default();

        let probe_secs = parse_env_var("TOOLGATE_PROBE_TIMEOUT_SECS", defaults.probe_timeout.as_secs());
        let run_secs = parse_env_var("TOOLGATE_RUN_TIMEOUT_SECS", defaults.run_timeout.as_secs());
        let poll_ms = parse_env_var(
            "TOOLGATE_POLL_INTERVAL_MS",
            defaults.runner.poll_interval.as_millis() as u64,
        );
        let grace_ms = parse_env_var(
            "TOOLGATE_GRACE_PERIOD_MS",
            defaults.runner.grace_period.as_millis() as u64,
        );
        let join_ms = parse_env_var(
            "TOOLGATE_READER_JOIN_TIMEOUT_MS",
            defaults.runner.reader_join_timeout.as_millis() as u64,
        );

        Self {
            tools_file: env_path("TOOLGATE_TOOLS_FILE", defaults.tools_file),
            temp_root: env_path("TOOLGATE_TEMP_DIR", defaults.temp_root),
            report_root: env_path("TOOLGATE_REPORT_DIR", defaults.report_root),
            probe_timeout: Duration::from_secs(probe_secs),
            run_timeout: Duration::from_secs(run_secs),
            runner: RunnerConfig {
                poll_interval: Duration::from_millis(poll_ms.max(1)),
                grace_period: Duration::from_millis(grace_ms),
                reader_join_timeout: Duration::from_millis(join_ms),
            },
        }
    }
}
