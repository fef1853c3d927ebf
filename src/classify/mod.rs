// Classify module - data-driven output classification

pub mod families;
pub mod rules;
pub mod types;

pub use families::{CHDMAN, DOLPHIN_TOOL, FamilyRules, IGIR, rules_for};
pub use rules::{Rule, RuleTable};
pub use types::{Classification, Extractor, Status};
