// Data types for the probe module

use crate::classify::Status;
use serde::Serialize;
use std::path::Path;

/// Availability and version of one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub available: bool,
    pub version: Option<String>,
    pub status: Status,
    pub message: String,
    pub raw_output: String,
    pub exit_code: Option<i32>,
}

impl ProbeResult {
    pub fn not_configured() -> Self {
        Self {
            available: false,
            version: None,
            status: Status::NotConfigured,
            message: "no executable configured".to_string(),
            raw_output: String::new(),
            exit_code: None,
        }
    }

    pub fn missing(executable: &Path) -> Self {
        Self {
            available: false,
            version: None,
            status: Status::Missing,
            message: format!("executable not found: {}", executable.display()),
            raw_output: String::new(),
            exit_code: None,
        }
    }

    pub fn error(message: impl Into<String>, raw_output: String, exit_code: Option<i32>) -> Self {
        Self {
            available: false,
            version: None,
            status: Status::Error,
            message: message.into(),
            raw_output,
            exit_code,
        }
    }
}
