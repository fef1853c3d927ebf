// Error types for the config module

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("tool '{0}' is not configured")]
    ToolNotConfigured(String),

    #[error("no executable configured")]
    ExecutableNotConfigured,

    #[error("executable not found: {}", .0.display())]
    ExecutableMissing(PathBuf),

    #[error("no argument template configured")]
    NoTemplate,

    #[error("unknown profile or template '{0}'")]
    UnknownProfile(String),

    #[error("{phase} requires {expected}")]
    WrongShape {
        phase: &'static str,
        expected: &'static str,
    },

    #[error("failed to read tools file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
