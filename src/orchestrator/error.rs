// Error types for the orchestrator module

use crate::config::ConfigError;
use crate::safety::{SafetyError, SandboxError};
use crate::staging::StagingError;
use crate::template::TemplateError;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failure category carried on every unsuccessful result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    Configuration,
    SandboxViolation,
    SafetyGate,
    ProcessLaunch,
    ToolFailure,
    Cancelled,
    Timeout,
    StagingPromotion,
}

/// Everything that can stop an orchestrated call
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("configuration error: {0}")]
    Template(#[from] TemplateError),

    #[error("configuration error: failed to prepare {}: {source}", path.display())]
    Directory {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Safety(#[from] SafetyError),

    #[error("process launch failed: {0}")]
    ProcessLaunch(String),

    #[error("input missing or not accessible: {0}")]
    InputUnavailable(String),

    #[error("input rejected as invalid: {0}")]
    InvalidInput(String),

    #[error("tool failed with exit code {0}")]
    ToolFailure(i32),

    #[error("cancelled")]
    Cancelled,

    #[error("timed out after {0}s")]
    Timeout(u64),

    #[error(transparent)]
    Staging(#[from] StagingError),
}

impl OrchestratorError {
    pub fn kind(&self) -> FailureKind {
        match self {
            OrchestratorError::Config(_)
            | OrchestratorError::Template(_)
            | OrchestratorError::Directory { .. } => FailureKind::Configuration,
            OrchestratorError::Safety(SafetyError::Sandbox(_)) => FailureKind::SandboxViolation,
            OrchestratorError::Safety(_) => FailureKind::SafetyGate,
            OrchestratorError::ProcessLaunch(_) => FailureKind::ProcessLaunch,
            OrchestratorError::InputUnavailable(_)
            | OrchestratorError::InvalidInput(_)
            | OrchestratorError::ToolFailure(_) => FailureKind::ToolFailure,
            OrchestratorError::Cancelled => FailureKind::Cancelled,
            OrchestratorError::Timeout(_) => FailureKind::Timeout,
            OrchestratorError::Staging(StagingError::Prepare { .. }) => FailureKind::Configuration,
            OrchestratorError::Staging(StagingError::Promotion { .. }) => {
                FailureKind::StagingPromotion
            }
        }
    }
}

impl From<SandboxError> for OrchestratorError {
    fn from(e: SandboxError) -> Self {
        OrchestratorError::Safety(SafetyError::Sandbox(e))
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
