// Placeholder substitution for argument templates

use super::error::{Result, TemplateError};
use std::collections::BTreeMap;
use std::path::Path;

/// Placeholder tokens understood by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Placeholder {
    Input,
    OutputFile,
    OutputDir,
    TempDir,
    ReportDir,
}

impl Placeholder {
    pub const ALL: [Placeholder; 5] = [
        Placeholder::Input,
        Placeholder::OutputFile,
        Placeholder::OutputDir,
        Placeholder::TempDir,
        Placeholder::ReportDir,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::Input => "{input}",
            Placeholder::OutputFile => "{output_file}",
            Placeholder::OutputDir => "{output_dir}",
            Placeholder::TempDir => "{temp_dir}",
            Placeholder::ReportDir => "{report_dir}",
        }
    }
}

/// Token values for one render
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    values: BTreeMap<Placeholder, String>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.values.insert(placeholder, value.into());
        self
    }

    pub fn set_path(self, placeholder: Placeholder, path: &Path) -> Self {
        self.set(placeholder, path.to_string_lossy().into_owned())
    }

    /// Set only when a path is present
    pub fn set_opt_path(self, placeholder: Placeholder, path: Option<&Path>) -> Self {
        match path {
            Some(p) => self.set_path(placeholder, p),
            None => self,
        }
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(String::as_str)
    }
}

/// Fails unless some entry carries `{input}`.
///
/// Runs before anything is spawned, so a tool is never pointed at no target.
pub fn validate(template: &[String]) -> Result<()> {
    if template.is_empty() {
        return Err(TemplateError::Empty);
    }
    if !template
        .iter()
        .any(|entry| entry.contains(Placeholder::Input.token()))
    {
        return Err(TemplateError::MissingInput);
    }
    Ok(())
}

/// Substitute every known placeholder and drop entries left empty.
///
/// Known tokens without a value render as "". Unknown `{...}` tokens pass
/// through verbatim. Fails when `{input}` has no value or an empty one.
pub fn render(template: &[String], vars: &TemplateVars) -> Result<Vec<String>> {
    validate(template)?;
    if vars
        .get(Placeholder::Input)
        .is_none_or(|input| input.trim().is_empty())
    {
        return Err(TemplateError::EmptyInput);
    }

    let argv = template
        .iter()
        .map(|entry| substitute(entry, vars))
        .filter(|arg| !arg.trim().is_empty())
        .collect();

    Ok(argv)
}

/// One left-to-right pass over `entry`. Substituted values are never rescanned.
fn substitute(entry: &str, vars: &TemplateVars) -> String {
    let mut out = String::with_capacity(entry.len());
    let mut rest = entry;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match Placeholder::ALL.iter().find(|p| tail.starts_with(p.token())) {
            Some(placeholder) => {
                out.push_str(vars.get(*placeholder).unwrap_or(""));
                rest = &tail[placeholder.token().len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_input_substituted_everywhere_in_order() {
        let template = strings(&["convert", "-i", "{input}", "--label={input}", "-o", "{output_file}"]);
        let vars = TemplateVars::new()
            .set(Placeholder::Input, "/roms/game.cue")
            .set(Placeholder::OutputFile, "/out/game.chd");

        let argv = render(&template, &vars).unwrap();
        assert_eq!(
            argv,
            strings(&[
                "convert",
                "-i",
                "/roms/game.cue",
                "--label=/roms/game.cue",
                "-o",
                "/out/game.chd"
            ])
        );
    }

    #[test]
    fn test_entries_that_become_empty_are_dropped() {
        let template = strings(&["{input}", "{report_dir}", "--tmp", "{temp_dir}"]);
        let vars = TemplateVars::new()
            .set(Placeholder::Input, "a.iso")
            .set(Placeholder::TempDir, "/tmp/x");

        let argv = render(&template, &vars).unwrap();
        assert_eq!(argv, strings(&["a.iso", "--tmp", "/tmp/x"]));
    }

    #[test]
    fn test_unknown_placeholder_left_verbatim() {
        let template = strings(&["{input}", "--dat", "{dat_file}"]);
        let vars = TemplateVars::new().set(Placeholder::Input, "x");

        let argv = render(&template, &vars).unwrap();
        assert_eq!(argv, strings(&["x", "--dat", "{dat_file}"]));
    }

    #[test]
    fn test_missing_input_rejected() {
        let template = strings(&["info", "{output_dir}"]);
        assert_eq!(validate(&template), Err(TemplateError::MissingInput));
        assert_eq!(
            render(&template, &TemplateVars::new()),
            Err(TemplateError::MissingInput)
        );
    }

    #[test]
    fn test_values_are_not_substituted_again() {
        let template = strings(&["{input}", "{output_dir}"]);
        let vars = TemplateVars::new()
            .set(Placeholder::Input, "/roms/{output_dir} bonus.iso")
            .set(Placeholder::OutputDir, "/out");

        let argv = render(&template, &vars).unwrap();
        assert_eq!(argv, strings(&["/roms/{output_dir} bonus.iso", "/out"]));
    }

    #[test]
    fn test_adjacent_and_unknown_braces() {
        let template = strings(&["{{input}}", "{input}{temp_dir}", "{"]);
        let vars = TemplateVars::new()
            .set(Placeholder::Input, "a")
            .set(Placeholder::TempDir, "/t");

        let argv = render(&template, &vars).unwrap();
        assert_eq!(argv, strings(&["{a}", "a/t", "{"]));
    }

    #[test]
    fn test_empty_input_value_rejected() {
        let template = strings(&["info", "{input}"]);
        assert_eq!(render(&template, &TemplateVars::new()), Err(TemplateError::EmptyInput));
        let blank = TemplateVars::new().set(Placeholder::Input, "  ");
        assert_eq!(render(&template, &blank), Err(TemplateError::EmptyInput));
    }

    #[test]
    fn test_empty_template_rejected() {
        assert_eq!(validate(&[]), Err(TemplateError::Empty));
    }
}
