// Final program + argument list for a rendered template
//
// Arguments go to the child as a vector. Only batch scripts on Windows, which
// cannot be exec'd directly, are routed through `cmd /C` with a joined line.

use std::path::{Path, PathBuf};

/// Program and arguments handed to the process runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub via_shell: bool,
}

impl Invocation {
    /// Build the invocation for the current platform
    pub fn for_target(executable: &Path, argv: &[String]) -> Self {
        Self::for_platform(executable, argv, cfg!(windows))
    }

    pub fn for_platform(executable: &Path, argv: &[String], windows: bool) -> Self {
        if windows && requires_shell(executable) {
            let mut parts = Vec::with_capacity(argv.len() + 1);
            parts.push(quote_arg(&executable.to_string_lossy()));
            parts.extend(argv.iter().map(|a| quote_arg(a)));
            return Self {
                program: PathBuf::from("cmd"),
                args: vec!["/C".to_string(), parts.join(" ")],
                via_shell: true,
            };
        }

        Self {
            program: executable.to_path_buf(),
            args: argv.to_vec(),
            via_shell: false,
        }
    }

    /// One-line rendering for logs
    pub fn display_line(&self) -> String {
        let mut parts = vec![quote_arg(&self.program.to_string_lossy())];
        parts.extend(self.args.iter().map(|a| quote_arg(a)));
        parts.join(" ")
    }
}

/// Batch scripts need the command interpreter
pub fn requires_shell(executable: &Path) -> bool {
    executable
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_ascii_lowercase();
            ext == "bat" || ext == "cmd"
        })
        .unwrap_or(false)
}

/// Wrap in double quotes when whitespace or quotes are present
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "\"\"".to_string();
    }
    if !arg.chars().any(|c| c.is_whitespace() || c == '"') {
        return arg.to_string();
    }
    format!("\"{}\"", arg.replace('"', "\\\""))
}
