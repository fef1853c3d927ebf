// Diff module - best-effort diff sidecars from plan output

use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// CSV header of the diff sidecar
pub const CSV_HEADER: &str = "op,src,dst,collision,policy_action,notes";

const ARROWS: [&str; 2] = ["->", "\u{2192}"];

/// Diff sidecar errors
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("failed to create report directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to encode diff rows: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One source/destination pair seen in tool output.
///
/// Fields that text alone cannot tell stay blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffRow {
    pub op: String,
    pub src: String,
    pub dst: String,
    pub collision: String,
    pub policy_action: String,
    pub notes: String,
}

#[derive(Serialize)]
struct DiffDocument<'a> {
    rows: &'a [DiffRow],
}

/// Paths of the written sidecars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffArtifacts {
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub row_count: usize,
}

/// Extract arrow-delimited rows. Lines without a usable arrow are skipped.
pub fn parse_rows(output: &str) -> Vec<DiffRow> {
    let mut rows = Vec::new();
    for line in output.lines() {
        let Some((src, dst)) = split_arrow(line) else {
            continue;
        };
        if src.is_empty() || dst.is_empty() {
            debug!(line = %line, "skipping arrow line with an empty side");
            continue;
        }
        rows.push(DiffRow {
            src: src.to_string(),
            dst: dst.to_string(),
            ..Default::default()
        });
    }
    rows
}

/// Split at the earliest arrow of either rendering
fn split_arrow(line: &str) -> Option<(&str, &str)> {
    ARROWS
        .iter()
        .filter_map(|arrow| line.find(arrow).map(|at| (at, arrow.len())))
        .min_by_key(|(at, _)| *at)
        .map(|(at, len)| (line[..at].trim(), line[at + len..].trim()))
}

/// Write `<stem>.csv` and `<stem>.json` into `dir`. Zero rows still writes both.
pub fn write_sidecars(rows: &[DiffRow], dir: &Path, stem: &str) -> Result<DiffArtifacts, DiffError> {
    fs::create_dir_all(dir).map_err(|source| DiffError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let csv_path = dir.join(format!("{stem}.csv"));
    let json_path = dir.join(format!("{stem}.json"));

    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for row in rows {
        let fields = [
            &row.op,
            &row.src,
            &row.dst,
            &row.collision,
            &row.policy_action,
            &row.notes,
        ];
        let line: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
        csv.push_str(&line.join(","));
        csv.push('\n');
    }
    fs::write(&csv_path, csv).map_err(|source| DiffError::Write {
        path: csv_path.clone(),
        source,
    })?;

    let json = serde_json::to_string_pretty(&DiffDocument { rows })?;
    fs::write(&json_path, json).map_err(|source| DiffError::Write {
        path: json_path.clone(),
        source,
    })?;

    info!(
        csv = %csv_path.display(),
        json = %json_path.display(),
        rows = rows.len(),
        "diff sidecars written"
    );
    Ok(DiffArtifacts {
        csv_path,
        json_path,
        row_count: rows.len(),
    })
}

/// RFC 4180 quoting: quote when a comma, quote or line break is present
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_arrow_renderings() {
        let out = "Scanning...\n\
                   /in/a.zip -> /out/SNES/a.zip\n\
                   /in/b.zip \u{2192} /out/GB/b.zip\n\
                   done";
        let rows = parse_rows(out);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].src, "/in/a.zip");
        assert_eq!(rows[1].dst, "/out/GB/b.zip");
        assert!(rows[0].op.is_empty() && rows[0].collision.is_empty());
    }

    #[test]
    fn test_split_on_first_arrow() {
        let rows = parse_rows("a -> b -> c");
        assert_eq!(rows[0].src, "a");
        assert_eq!(rows[0].dst, "b -> c");
    }

    #[test]
    fn test_empty_side_skipped() {
        assert!(parse_rows("-> nowhere\nsomewhere ->").is_empty());
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"x\""), "\"say \"\"x\"\"\"");
    }

    #[test]
    fn test_zero_rows_still_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = write_sidecars(&[], dir.path(), "igir_plan_diff").unwrap();

        let csv = fs::read_to_string(&artifacts.csv_path).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert_eq!(csv.lines().next(), Some(CSV_HEADER));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&artifacts.json_path).unwrap()).unwrap();
        assert_eq!(json["rows"].as_array().map(Vec::len), Some(0));
    }
}
