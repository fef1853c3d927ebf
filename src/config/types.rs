// Tool configuration records

use super::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn default_true() -> bool {
    true
}

/// Plan and execute argument templates of a two-phase tool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTemplates {
    #[serde(default)]
    pub plan: Vec<String>,
    #[serde(default)]
    pub execute: Vec<String>,
}

/// Either phase-specific templates or one flat list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgsTemplate {
    Flat(Vec<String>),
    Phased(PhaseTemplates),
}

/// Which template a call needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    OneShot,
    Plan,
    Execute,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::OneShot => "run",
            Phase::Plan => "plan",
            Phase::Execute => "execute",
        }
    }
}

/// One external tool, as configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub executable_path: Option<PathBuf>,
    #[serde(default, alias = "arg_template")]
    pub args_template: Option<ArgsTemplate>,
    #[serde(default)]
    pub templates: BTreeMap<String, ArgsTemplate>,
    #[serde(default)]
    pub profiles: BTreeMap<String, ArgsTemplate>,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default, alias = "copy_first_staging_enabled")]
    pub copy_first_staging: bool,
    #[serde(default = "default_true")]
    pub dry_run_suppresses_execution: bool,
    #[serde(default = "default_true")]
    pub require_plan_before_execute: bool,
    #[serde(default = "default_true")]
    pub require_explicit_confirmation: bool,
    #[serde(default = "default_true")]
    pub enforce_destination_sandbox: bool,
    /// Overrides the family's built-in probe arguments
    #[serde(default)]
    pub probe_args: Option<Vec<String>>,
    /// Rule family name when it differs from the tool key
    #[serde(default)]
    pub family: Option<String>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            executable_path: None,
            args_template: None,
            templates: BTreeMap::new(),
            profiles: BTreeMap::new(),
            active_profile: None,
            copy_first_staging: false,
            dry_run_suppresses_execution: true,
            require_plan_before_execute: true,
            require_explicit_confirmation: true,
            enforce_destination_sandbox: true,
            probe_args: None,
            family: None,
        }
    }
}

impl ToolConfig {
    /// Executable path, treating an empty string as unset
    pub fn executable(&self) -> Option<&PathBuf> {
        self.executable_path
            .as_ref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Template in effect: active profile, else named template, else `args_template`
    pub fn selected_template(&self) -> Result<&ArgsTemplate> {
        if let Some(name) = &self.active_profile {
            return self
                .profiles
                .get(name)
                .or_else(|| self.templates.get(name))
                .ok_or_else(|| ConfigError::UnknownProfile(name.clone()));
        }
        self.args_template.as_ref().ok_or(ConfigError::NoTemplate)
    }

    /// Argument list for `phase`, rejecting a template of the wrong shape
    pub fn template_for(&self, phase: Phase) -> Result<&[String]> {
        match (self.selected_template()?, phase) {
            (ArgsTemplate::Flat(args), Phase::OneShot) => Ok(args),
            (ArgsTemplate::Phased(t), Phase::Plan) => Ok(&t.plan),
            (ArgsTemplate::Phased(t), Phase::Execute) => Ok(&t.execute),
            (ArgsTemplate::Flat(_), _) => Err(ConfigError::WrongShape {
                phase: phase.as_str(),
                expected: "plan/execute templates",
            }),
            (ArgsTemplate::Phased(_), _) => Err(ConfigError::WrongShape {
                phase: phase.as_str(),
                expected: "a flat argument list",
            }),
        }
    }

    /// Tools with plan/execute templates are the destructive, gated kind
    pub fn is_two_phase(&self) -> bool {
        matches!(self.selected_template(), Ok(ArgsTemplate::Phased(_)))
    }
}

/// Top-level tools file: `[tools.<key>]` tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsFile {
    #[serde(default)]
    pub tools: BTreeMap<String, ToolConfig>,
}
