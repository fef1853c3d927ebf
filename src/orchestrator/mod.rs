// Orchestrator module - per-tool probe, run, plan and execute
//
// Every public call returns a result object. Anything that fails before a
// process is spawned comes back as a refused result with a failure kind.

pub mod error;
pub mod facade;
pub mod family;
pub mod types;
pub mod worker;

pub use error::{FailureKind, OrchestratorError};
pub use facade::ToolOrchestrator;
pub use family::ToolFamily;
pub use types::{ExecuteRequest, PlanRequest, PlanResult, RunRequest, ToolRunResult};
pub use worker::{BackgroundInvocation, spawn_invocation};
