// Safety module - gates for destructive tool calls

pub mod error;
pub mod gate;
pub mod sandbox;

pub use error::{SafetyError, SandboxError};
pub use gate::{GateDecision, GateRequest, SafetyPolicy, evaluate};
pub use sandbox::{resolve, resolve_within};
