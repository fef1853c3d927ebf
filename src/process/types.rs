// Data types for the process module

use serde::Serialize;
use std::sync::Arc;

/// Exit code reported when the child could not be launched at all
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = -9999;

/// Exit code reported when the child was ended by a signal
pub const SIGNAL_EXIT_CODE: i32 = -1;

/// Which standard stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }
}

/// Callback receiving each output line as it is read.
///
/// Invoked from the reader tasks, so it must be safe to call from any thread.
pub type OutputSink = Arc<dyn Fn(StreamKind, &str) + Send + Sync>;

/// Outcome of one child process invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub stdout_text: String,
    pub stderr_text: String,
    pub was_cancelled: bool,
    pub timed_out: bool,
}

impl ProcessResult {
    /// Result for a child that never started
    pub fn launch_failed(detail: impl Into<String>) -> Self {
        Self {
            exit_code: LAUNCH_FAILURE_EXIT_CODE,
            stdout_text: String::new(),
            stderr_text: detail.into(),
            was_cancelled: false,
            timed_out: false,
        }
    }

    pub fn is_launch_failure(&self) -> bool {
        self.exit_code == LAUNCH_FAILURE_EXIT_CODE
    }

    /// Natural exit with status zero, not cancelled, not timed out
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0 && !self.was_cancelled && !self.timed_out
    }

    /// stdout followed by stderr, the text every classifier looks at
    pub fn combined_output(&self) -> String {
        match (self.stdout_text.is_empty(), self.stderr_text.is_empty()) {
            (_, true) => self.stdout_text.clone(),
            (true, false) => self.stderr_text.clone(),
            (false, false) => format!("{}\n{}", self.stdout_text, self.stderr_text),
        }
    }
}
