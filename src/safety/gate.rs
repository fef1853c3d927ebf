// Pre-flight checks for destructive tool calls
//
// Checks run in a fixed order and stop at the first refusal. Nothing here
// spawns a process, and no earlier probe result is consulted.

use super::error::{Result, SafetyError, SandboxError};
use super::sandbox::resolve_within;
use crate::config::{Phase, ToolConfig};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Safety switches taken from a tool's configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyPolicy {
    pub dry_run_suppresses_execution: bool,
    pub require_plan_before_execute: bool,
    pub require_explicit_confirmation: bool,
    pub enforce_destination_sandbox: bool,
}

impl From<&ToolConfig> for SafetyPolicy {
    fn from(config: &ToolConfig) -> Self {
        Self {
            dry_run_suppresses_execution: config.dry_run_suppresses_execution,
            require_plan_before_execute: config.require_plan_before_execute,
            require_explicit_confirmation: config.require_explicit_confirmation,
            enforce_destination_sandbox: config.enforce_destination_sandbox,
        }
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self::from(&ToolConfig::default())
    }
}

/// Facts about one call that the gate needs
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub phase: Phase,
    pub dry_run: bool,
    /// Evidence, threaded by the caller, that a plan for this work succeeded
    pub plan_confirmed: bool,
    /// Set only from a genuine interactive confirmation upstream
    pub explicit_confirmation: bool,
    pub output_dir: Option<&'a Path>,
    pub destination_root: Option<&'a Path>,
}

/// Outcome of a passed gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Stop here and report a dry run
    DryRun,
    /// Go ahead; carries the sandbox-resolved output directory when checked
    Proceed { resolved_output: Option<PathBuf> },
}

/// Evaluate the checks in order: dry-run, plan, confirmation, sandbox.
///
/// One-shot calls only get the dry-run check; plans get dry-run and sandbox.
pub fn evaluate(policy: &SafetyPolicy, request: &GateRequest<'_>) -> Result<GateDecision> {
    if request.dry_run && policy.dry_run_suppresses_execution {
        debug!(phase = request.phase.as_str(), "dry run suppresses execution");
        return Ok(GateDecision::DryRun);
    }

    if request.phase == Phase::Execute {
        if policy.require_plan_before_execute && !request.plan_confirmed {
            warn!("execute refused: no confirmed plan");
            return Err(SafetyError::PlanRequired);
        }
        if policy.require_explicit_confirmation && !request.explicit_confirmation {
            warn!("execute refused: no explicit confirmation");
            return Err(SafetyError::ConfirmationRequired);
        }
    }

    let mut resolved_output = None;
    if request.phase != Phase::OneShot && policy.enforce_destination_sandbox {
        let root = request.destination_root.ok_or(SandboxError::NoRoot)?;
        let output = request.output_dir.ok_or(SandboxError::NoOutputDir)?;
        let resolved = resolve_within(root, output).inspect_err(|e| {
            warn!(error = %e, "sandbox check failed");
        })?;
        debug!(output = %resolved.display(), root = %root.display(), "output inside destination root");
        resolved_output = Some(resolved);
    }

    Ok(GateDecision::Proceed { resolved_output })
}
