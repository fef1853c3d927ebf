// Data types for the classify module

use serde::Serialize;
use std::fmt;

/// Semantic status derived from a tool's output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    NotConfigured,
    Missing,
    Ok,
    Error,
    /// The tool could not open the input it was given
    OpenFailure,
    /// The tool rejected its input as invalid
    InvalidInput,
    /// The input was missing or not readable during a real run
    InputUnavailable,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotConfigured => "not-configured",
            Status::Missing => "missing",
            Status::Ok => "ok",
            Status::Error => "error",
            Status::OpenFailure => "open-failure",
            Status::InvalidInput => "invalid-input",
            Status::InputUnavailable => "input-unavailable",
        }
    }

    /// Fallback when no rule matched
    pub fn from_exit_code(exit_code: i32) -> Self {
        if exit_code == 0 { Status::Ok } else { Status::Error }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a matching rule pulls out of the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    None,
    /// Capture group holding a version string
    Version(usize),
}

/// Classifier verdict for one output blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: Status,
    pub version: Option<String>,
    /// Text of the match that decided the status, if a rule decided it
    pub matched: Option<String>,
}
