//! Creating the ancestor directories of a target file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

/// Ensure every ancestor directory of `target` exists.
///
/// Returns the directories that had to be created, outermost first. Fails if an
/// existing ancestor is not a directory.
pub fn ensure_parent_dirs(target: &Path) -> Result<Vec<PathBuf>> {
    let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(Vec::new());
    };

    let missing = missing_ancestors(parent)?;
    if missing.is_empty() {
        return Ok(missing);
    }
    fs::create_dir_all(parent)
        .with_context(|| format!("create directory {}", parent.display()))?;
    Ok(missing)
}

/// Walk up from `dir` until an existing directory is found.
fn missing_ancestors(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut missing = Vec::new();
    for ancestor in dir.ancestors() {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        match fs::metadata(ancestor) {
            Ok(metadata) if metadata.is_dir() => break,
            Ok(_) => bail!("{} exists and is not a directory", ancestor.display()),
            // A file further up reports NotADirectory here; keep walking to name it.
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                missing.push(ancestor.to_path_buf());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("inspect {}", ancestor.display()));
            }
        }
    }
    missing.reverse();
    Ok(missing)
}
