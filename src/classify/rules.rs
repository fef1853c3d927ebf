// Ordered rule table evaluated against captured output

use super::types::{Classification, Extractor, Status};
use regex::Regex;
use tracing::{debug, warn};

/// One `(pattern, status, extractor)` entry
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: &'static str,
    pub pattern: Regex,
    pub status: Option<Status>,
    pub extractor: Extractor,
}

/// Ordered rules for one tool family and purpose
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule. A pattern that fails to compile is logged and skipped.
    pub fn rule(
        mut self,
        name: &'static str,
        pattern: &str,
        status: Option<Status>,
        extractor: Extractor,
    ) -> Self {
        match Regex::new(pattern) {
            Ok(pattern) => self.rules.push(Rule {
                name,
                pattern,
                status,
                extractor,
            }),
            Err(e) => warn!(rule = name, error = %e, "skipping rule with invalid pattern"),
        }
        self
    }

    pub fn status_rule(self, name: &'static str, pattern: &str, status: Status) -> Self {
        self.rule(name, pattern, Some(status), Extractor::None)
    }

    pub fn version_rule(self, name: &'static str, pattern: &str) -> Self {
        self.rule(name, pattern, None, Extractor::Version(1))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First status-bearing match decides the status, first version match
    /// decides the version. With no status match the exit code decides.
    pub fn classify(&self, output: &str, exit_code: i32) -> Classification {
        let mut status = None;
        let mut matched = None;
        let mut version = None;

        for rule in &self.rules {
            let need_status = status.is_none() && rule.status.is_some();
            let need_version = version.is_none() && matches!(rule.extractor, Extractor::Version(_));
            if !need_status && !need_version {
                continue;
            }

            let Some(captures) = rule.pattern.captures(output) else {
                continue;
            };

            if need_status {
                debug!(rule = rule.name, "status rule matched");
                status = rule.status;
                matched = captures.get(0).map(|m| m.as_str().to_string());
            }
            if need_version {
                if let Extractor::Version(group) = rule.extractor {
                    version = captures.get(group).map(|m| m.as_str().to_string());
                }
            }
        }

        Classification {
            status: status.unwrap_or_else(|| Status::from_exit_code(exit_code)),
            version,
            matched,
        }
    }
}
