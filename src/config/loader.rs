// Tools file loading

use super::error::{ConfigError, Result};
use super::types::ToolsFile;
use std::path::Path;
use tracing::debug;

/// Load the tools file. A missing file yields an empty tool set.
///
/// `.json` files are read as JSON, everything else as TOML.
pub fn load_tools_file(path: &Path) -> Result<ToolsFile> {
    if !path.exists() {
        debug!(path = %path.display(), "tools file not found, no tools configured");
        return Ok(ToolsFile::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let file = if is_json {
        parse_json(&content)?
    } else {
        parse_toml(&content)?
    };

    debug!(path = %path.display(), tool_count = file.tools.len(), "loaded tools file");
    Ok(file)
}

pub fn parse_toml(content: &str) -> Result<ToolsFile> {
    Ok(toml::from_str(content)?)
}

pub fn parse_json(content: &str) -> Result<ToolsFile> {
    Ok(serde_json::from_str(content)?)
}
