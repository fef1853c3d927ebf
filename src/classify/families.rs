// Rule tables per tool family
//
// Adding a tool family means adding a branch here, not a new code path in the
// orchestrator.

use super::rules::RuleTable;
use super::types::Status;
use std::path::Path;

/// Family names with built-in rules
pub const CHDMAN: &str = "chdman";
pub const DOLPHIN_TOOL: &str = "dolphin-tool";
pub const IGIR: &str = "igir";

/// Rules a family uses for probing and for real runs
#[derive(Debug, Clone)]
pub struct FamilyRules {
    pub probe: RuleTable,
    pub run: RuleTable,
}

/// "Failed to open `<path>`!" for exactly the synthetic probe input
fn open_failure_pattern(probe_input: &Path) -> String {
    format!(
        r#"Failed to open\s*[`'"]?{}[`'"]?"#,
        regex::escape(&probe_input.to_string_lossy())
    )
}

const INPUT_UNAVAILABLE: &str =
    r"(?i)(no such file or directory|missing or not accessible|not accessible|error opening input file)";

const GENERIC_INVALID_INPUT: &str =
    r"(?i)(not a valid|unsupported (?:file|format)|invalid (?:input|disc|image|file))";

/// Rules for `family`, with the open-failure rule bound to `probe_input`
pub fn rules_for(family: &str, probe_input: &Path) -> FamilyRules {
    match family {
        CHDMAN => FamilyRules {
            probe: RuleTable::new()
                .status_rule("chdman-open-failure", &open_failure_pattern(probe_input), Status::OpenFailure)
                .version_rule("chdman-banner", r"(?i)manager\s+v?(\d+\.\d+(?:\.\d+)?)"),
            run: RuleTable::new()
                .status_rule("chdman-input-unavailable", INPUT_UNAVAILABLE, Status::InputUnavailable)
                .version_rule("chdman-banner", r"(?i)manager\s+v?(\d+\.\d+(?:\.\d+)?)"),
        },
        DOLPHIN_TOOL => FamilyRules {
            probe: RuleTable::new()
                .status_rule("dolphin-invalid-input", GENERIC_INVALID_INPUT, Status::InvalidInput)
                .status_rule("dolphin-unable-to-open", r"(?i)(unable|could not|failed) to open", Status::InvalidInput)
                .version_rule("dolphin-banner", r"(?i)dolphin[^\n]*?\bv?(\d+\.\d+(?:[-.]\d+)?)"),
            run: RuleTable::new()
                .status_rule("dolphin-input-unavailable", INPUT_UNAVAILABLE, Status::InputUnavailable)
                .status_rule("dolphin-invalid-input", GENERIC_INVALID_INPUT, Status::InvalidInput),
        },
        IGIR => FamilyRules {
            probe: RuleTable::new()
                .status_rule("igir-open-failure", &open_failure_pattern(probe_input), Status::OpenFailure)
                .status_rule(
                    "igir-no-input",
                    r"(?i)(no (?:input )?files? (?:found|matched)|invalid input)",
                    Status::InvalidInput,
                )
                .version_rule("igir-banner", r"(?i)igir\s+v?(\d+\.\d+(?:\.\d+)?)"),
            run: RuleTable::new()
                .status_rule("igir-input-unavailable", INPUT_UNAVAILABLE, Status::InputUnavailable)
                .status_rule("igir-invalid-input", GENERIC_INVALID_INPUT, Status::InvalidInput),
        },
        _ => FamilyRules {
            probe: RuleTable::new()
                .status_rule("generic-open-failure", &open_failure_pattern(probe_input), Status::OpenFailure)
                .version_rule("generic-version", r"(?i)\bv(?:ersion)?\s*(\d+\.\d+(?:\.\d+)?)"),
            run: RuleTable::new()
                .status_rule("generic-input-unavailable", INPUT_UNAVAILABLE, Status::InputUnavailable),
        },
    }
}
