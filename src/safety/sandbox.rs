// Destination sandbox: path containment with symlinks followed

use super::error::SandboxError;
use std::path::{Component, Path, PathBuf};

/// Resolve `candidate` and require it to lie within `root`.
///
/// The longest existing ancestor of `candidate` is canonicalized, so symlinks
/// are followed; the not-yet-existing remainder is applied lexically.
/// Relative candidates resolve against the current directory, the same place
/// the tool would resolve them.
pub fn resolve_within(root: &Path, candidate: &Path) -> Result<PathBuf, SandboxError> {
    let root = root
        .canonicalize()
        .map_err(|e| SandboxError::InvalidRoot {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;

    let resolved = resolve(candidate)?;
    if resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        Err(SandboxError::Escapes { resolved, root })
    }
}

/// Canonical form of a path that may not exist yet
pub fn resolve(candidate: &Path) -> Result<PathBuf, SandboxError> {
    let absolute = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| SandboxError::Unresolvable {
                path: candidate.to_path_buf(),
                reason: e.to_string(),
            })?
            .join(candidate)
    };

    let components: Vec<Component<'_>> = absolute.components().collect();
    for split in (1..=components.len()).rev() {
        let prefix: PathBuf = components[..split].iter().collect();
        let Ok(mut resolved) = prefix.canonicalize() else {
            continue;
        };
        for component in &components[split..] {
            match component {
                Component::Normal(name) => resolved.push(name),
                Component::ParentDir => {
                    resolved.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }
        return Ok(resolved);
    }

    Err(SandboxError::Unresolvable {
        path: candidate.to_path_buf(),
        reason: "no existing ancestor".to_string(),
    })
}
