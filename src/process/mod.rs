// Process module - child process lifecycle
//
// One child per call: spawn, stream both pipes line by line, poll for
// cancellation/timeout/exit, and tear down the whole process tree.

pub mod cancel;
pub mod config;
pub mod runner;
pub mod terminator;
pub mod types;

pub use cancel::CancelToken;
pub use config::RunnerConfig;
pub use runner::ProcessRunner;
#[cfg(unix)]
pub use terminator::ProcessGroupTerminator;
pub use terminator::{ProcessTerminator, ProcessTreeTerminator, default_terminator};
pub use types::{
    LAUNCH_FAILURE_EXIT_CODE, OutputSink, ProcessResult, SIGNAL_EXIT_CODE, StreamKind,
};
