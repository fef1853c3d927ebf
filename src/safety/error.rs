// Error types for the safety module

use std::path::PathBuf;
use thiserror::Error;

/// Destination sandbox violations
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("destination sandbox violation: no destination root supplied")]
    NoRoot,

    #[error("destination sandbox violation: no output directory supplied")]
    NoOutputDir,

    #[error("destination sandbox violation: invalid destination root {}: {reason}", path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("destination sandbox violation: cannot resolve {}: {reason}", path.display())]
    Unresolvable { path: PathBuf, reason: String },

    #[error("destination sandbox violation: {} is outside {}", resolved.display(), root.display())]
    Escapes { resolved: PathBuf, root: PathBuf },
}

/// Safety gate refusals
#[derive(Debug, Error)]
pub enum SafetyError {
    #[error("plan required: a successful plan must precede execute")]
    PlanRequired,

    #[error("explicit confirmation required before execute")]
    ConfirmationRequired,

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

pub type Result<T> = std::result::Result<T, SafetyError>;
