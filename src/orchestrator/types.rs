// Request and result types for the orchestrator

use super::error::{FailureKind, OrchestratorError};
use crate::process::ProcessResult;
use serde::Serialize;
use std::path::PathBuf;

/// One-shot tool call
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub input: PathBuf,
    pub output_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub dry_run: bool,
}

/// Plan phase of a two-phase tool
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub destination_root: Option<PathBuf>,
    pub dry_run: bool,
}

/// Execute phase of a two-phase tool
#[derive(Debug, Clone, Default)]
pub struct ExecuteRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub destination_root: Option<PathBuf>,
    /// A plan for this work was accepted earlier
    pub plan_confirmed: bool,
    /// Comes from a real interactive confirmation, never defaulted on
    pub explicit_confirmation: bool,
    pub dry_run: bool,
}

/// Result of a one-shot tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolRunResult {
    pub succeeded: bool,
    pub was_cancelled: bool,
    pub message: String,
    pub raw_output: String,
    pub timed_out: bool,
    pub exit_code: Option<i32>,
    pub failure: Option<FailureKind>,
}

impl ToolRunResult {
    /// Refused before any process work
    pub fn rejected(err: &OrchestratorError) -> Self {
        Self {
            succeeded: false,
            was_cancelled: false,
            message: err.to_string(),
            raw_output: String::new(),
            timed_out: false,
            exit_code: None,
            failure: Some(err.kind()),
        }
    }

    pub fn dry_run(message: String) -> Self {
        Self {
            succeeded: true,
            was_cancelled: false,
            message,
            raw_output: String::new(),
            timed_out: false,
            exit_code: None,
            failure: None,
        }
    }

    pub fn from_process(result: &ProcessResult, outcome: Result<String, OrchestratorError>) -> Self {
        let (succeeded, message, failure) = match outcome {
            Ok(message) => (true, message, None),
            Err(e) => (false, e.to_string(), Some(e.kind())),
        };
        Self {
            succeeded,
            was_cancelled: result.was_cancelled,
            message,
            raw_output: result.combined_output(),
            timed_out: result.timed_out,
            exit_code: Some(result.exit_code),
            failure,
        }
    }
}

/// Result of a plan or execute call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanResult {
    pub accepted: bool,
    pub was_cancelled: bool,
    pub timed_out: bool,
    pub message: String,
    pub raw_stdout: String,
    pub diff_csv_path: Option<PathBuf>,
    pub diff_json_path: Option<PathBuf>,
    pub staging_dir: Option<PathBuf>,
    pub exit_code: Option<i32>,
    pub failure: Option<FailureKind>,
}

impl PlanResult {
    pub fn rejected(err: &OrchestratorError) -> Self {
        Self {
            accepted: false,
            was_cancelled: false,
            timed_out: false,
            message: err.to_string(),
            raw_stdout: String::new(),
            diff_csv_path: None,
            diff_json_path: None,
            staging_dir: None,
            exit_code: None,
            failure: Some(err.kind()),
        }
    }

    pub fn dry_run(message: String) -> Self {
        Self {
            accepted: true,
            was_cancelled: false,
            timed_out: false,
            message,
            raw_stdout: String::new(),
            diff_csv_path: None,
            diff_json_path: None,
            staging_dir: None,
            exit_code: None,
            failure: None,
        }
    }

    pub fn from_process(result: &ProcessResult, outcome: Result<String, OrchestratorError>) -> Self {
        let (accepted, message, failure) = match outcome {
            Ok(message) => (true, message, None),
            Err(e) => (false, e.to_string(), Some(e.kind())),
        };
        Self {
            accepted,
            was_cancelled: result.was_cancelled,
            timed_out: result.timed_out,
            message,
            raw_stdout: result.stdout_text.clone(),
            diff_csv_path: None,
            diff_json_path: None,
            staging_dir: None,
            exit_code: Some(result.exit_code),
            failure,
        }
    }
}
