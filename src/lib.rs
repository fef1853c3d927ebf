// toolgate - safety-gated orchestration of external command-line tools

pub mod classify;
pub mod config;
pub mod diff;
pub mod orchestrator;
pub mod probe;
pub mod process;
pub mod safety;
pub mod staging;
pub mod template;

pub use config::{OrchestratorConfig, ToolConfig, ToolsFile};
pub use orchestrator::{
    BackgroundInvocation, ExecuteRequest, FailureKind, PlanRequest, PlanResult, RunRequest,
    ToolOrchestrator, ToolRunResult, spawn_invocation,
};
pub use probe::ProbeResult;
pub use process::{CancelToken, OutputSink, StreamKind};
