// Staging module - copy-first execution
//
// A destructive execute writes into `<temp_root>/<tool>_copy_first`, emptied
// when the execute starts, and the tree is merged into the real destination
// only after a clean success.
// Promotion is a plain recursive copy: an interruption mid-copy leaves the
// destination partially updated, and nothing here repairs that.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Staging errors
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("failed to prepare staging directory {}: {source}", path.display())]
    Prepare { path: PathBuf, source: io::Error },

    #[error("staging promotion failed: {} -> {}: {source}", from.display(), to.display())]
    Promotion {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

/// Counts from one promotion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromotionReport {
    pub files_copied: usize,
    pub dirs_created: usize,
}

/// Staging area for one tool's execute calls
#[derive(Debug, Clone)]
pub struct CopyFirstStaging {
    staging_dir: PathBuf,
}

impl CopyFirstStaging {
    /// Deterministic staging path: `<temp_root>/<tool>_copy_first`
    pub fn for_tool(temp_root: &Path, tool: &str) -> Self {
        Self {
            staging_dir: temp_root.join(format!("{tool}_copy_first")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.staging_dir
    }

    /// Create the staging directory if missing. Existing content is kept.
    pub fn prepare(&self) -> Result<&Path, StagingError> {
        fs::create_dir_all(&self.staging_dir).map_err(|source| StagingError::Prepare {
            path: self.staging_dir.clone(),
            source,
        })?;
        debug!(staging = %self.staging_dir.display(), "staging directory ready");
        Ok(&self.staging_dir)
    }

    /// Empty the staging directory, leaving it in place.
    ///
    /// Runs at the start of each execute, so output left by an earlier
    /// failed or cancelled run stays inspectable only until then.
    pub fn reset(&self) -> Result<&Path, StagingError> {
        if self.staging_dir.exists() {
            fs::remove_dir_all(&self.staging_dir).map_err(|source| StagingError::Prepare {
                path: self.staging_dir.clone(),
                source,
            })?;
            debug!(staging = %self.staging_dir.display(), "stale staging content removed");
        }
        self.prepare()
    }

    /// Merge the staging tree into `destination`, overwriting files
    pub fn promote(&self, destination: &Path) -> Result<PromotionReport, StagingError> {
        let mut report = PromotionReport::default();
        copy_tree(&self.staging_dir, destination, &mut report).map_err(|(from, to, source)| {
            StagingError::Promotion { from, to, source }
        })?;
        info!(
            staging = %self.staging_dir.display(),
            destination = %destination.display(),
            files_copied = report.files_copied,
            dirs_created = report.dirs_created,
            "staging promoted"
        );
        Ok(report)
    }
}

type CopyFailure = (PathBuf, PathBuf, io::Error);

fn copy_tree(from: &Path, to: &Path, report: &mut PromotionReport) -> Result<(), CopyFailure> {
    let fail = |source: io::Error| (from.to_path_buf(), to.to_path_buf(), source);

    if !to.is_dir() {
        fs::create_dir_all(to).map_err(fail)?;
        report.dirs_created += 1;
    }

    for entry in fs::read_dir(from).map_err(fail)? {
        let entry = entry.map_err(fail)?;
        let source = entry.path();
        let target = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(fail)?;

        if file_type.is_dir() {
            copy_tree(&source, &target, report)?;
        } else {
            fs::copy(&source, &target).map_err(|e| (source.clone(), target.clone(), e))?;
            report.files_copied += 1;
        }
    }
    Ok(())
}
