// Tool family resolution: rule tables plus probe arguments

use crate::classify::{CHDMAN, DOLPHIN_TOOL, FamilyRules, IGIR, rules_for};
use crate::config::ToolConfig;
use std::path::Path;

/// Everything family-specific the orchestrator needs for one tool key
#[derive(Debug, Clone)]
pub struct ToolFamily {
    pub name: String,
    pub probe_args: Vec<String>,
    pub rules: FamilyRules,
}

impl ToolFamily {
    /// Family named by the config, else the tool key itself
    pub fn resolve(tool: &str, config: Option<&ToolConfig>, probe_input: &Path) -> Self {
        let name = config
            .and_then(|c| c.family.clone())
            .unwrap_or_else(|| tool.to_string());
        let probe_args = config
            .and_then(|c| c.probe_args.clone())
            .unwrap_or_else(|| default_probe_args(&name));
        Self {
            rules: rules_for(&name, probe_input),
            name,
            probe_args,
        }
    }
}

/// Read-only subcommands that make each tool open its input and stop
fn default_probe_args(family: &str) -> Vec<String> {
    let args: &[&str] = match family {
        CHDMAN => &["info", "--input", "{input}"],
        DOLPHIN_TOOL => &["header", "-i", "{input}"],
        IGIR => &["report", "--input", "{input}"],
        _ => &["{input}"],
    };
    args.iter().map(|s| s.to_string()).collect()
}
