// Probe module - side-effect-free availability checks
//
// A probe points the tool at a synthetic input that never exists. A tool that
// complains about exactly that input has reached its own input validation,
// which proves the binary runs, even though it exits non-zero.

pub mod types;

pub use types::ProbeResult;

use crate::classify::{RuleTable, Status};
use crate::config::ToolConfig;
use crate::process::{CancelToken, ProcessRunner};
use crate::template::{self, Placeholder, TemplateVars};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Synthetic probe input, relative to the temp root. Never created.
pub const PROBE_INPUT_RELATIVE: &str = "__toolgate_probe__/nonexistent-input.bin";

/// The one fixed synthetic input used for every probe under `temp_root`
pub fn probe_input_path(temp_root: &Path) -> PathBuf {
    temp_root.join(PROBE_INPUT_RELATIVE)
}

/// Probes tools through a shared runner
pub struct ToolProbe<'a> {
    runner: &'a ProcessRunner,
    timeout: Duration,
    probe_input: PathBuf,
}

impl<'a> ToolProbe<'a> {
    pub fn new(runner: &'a ProcessRunner, timeout: Duration, temp_root: &Path) -> Self {
        Self {
            runner,
            timeout,
            probe_input: probe_input_path(temp_root),
        }
    }

    pub fn probe_input(&self) -> &Path {
        &self.probe_input
    }

    /// Probe one tool with its probe template and rule table
    pub async fn probe(
        &self,
        tool: &str,
        config: Option<&ToolConfig>,
        probe_args: &[String],
        rules: &RuleTable,
    ) -> ProbeResult {
        let Some(executable) = config.and_then(ToolConfig::executable) else {
            debug!(tool = %tool, "probe: not configured");
            return ProbeResult::not_configured();
        };
        if !executable.exists() {
            debug!(tool = %tool, executable = %executable.display(), "probe: executable missing");
            return ProbeResult::missing(executable);
        }

        let vars = TemplateVars::new().set_path(Placeholder::Input, &self.probe_input);
        let argv = match template::render(probe_args, &vars) {
            Ok(argv) => argv,
            Err(e) => return ProbeResult::error(format!("invalid probe template: {e}"), String::new(), None),
        };

        let result = self
            .runner
            .run(executable, &argv, self.timeout, &CancelToken::new(), None)
            .await;
        let raw_output = result.combined_output();

        if result.is_launch_failure() {
            return ProbeResult::error(
                format!("launch failed: {}", result.stderr_text),
                raw_output,
                Some(result.exit_code),
            );
        }
        if result.timed_out {
            return ProbeResult::error(
                format!("probe timed out after {}s", self.timeout.as_secs()),
                raw_output,
                Some(result.exit_code),
            );
        }

        let classification = rules.classify(&raw_output, result.exit_code);
        let available = counts_as_available(classification.status);
        let message = match classification.status {
            Status::Ok => "tool available".to_string(),
            other if available => format!("tool available (probe input rejected: {other})"),
            _ => format!("tool exited with code {}", result.exit_code),
        };

        info!(
            tool = %tool,
            status = %classification.status,
            available,
            version = classification.version.as_deref().unwrap_or("unknown"),
            "probe finished"
        );

        ProbeResult {
            available,
            version: classification.version,
            status: classification.status,
            message,
            raw_output,
            exit_code: Some(result.exit_code),
        }
    }
}

/// Statuses that prove the binary ran and reached its own input handling
fn counts_as_available(status: Status) -> bool {
    matches!(status, Status::Ok | Status::OpenFailure | Status::InvalidInput)
}
