//! Writing change content to disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// How file content reaches disk. Both modes fully replace existing content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Truncate and write in place.
    #[default]
    Direct,
    /// Write a sibling temp file, then rename it over the target.
    Atomic,
}

/// Create or overwrite `path` with `content` (UTF-8). Returns bytes written.
///
/// Parent directories must already exist.
pub fn write_file(path: &Path, content: &str, mode: WriteMode) -> Result<u64> {
    if path.is_dir() {
        bail!("{} is a directory", path.display());
    }
    match mode {
        WriteMode::Direct => {
            fs::write(path, content).with_context(|| format!("write {}", path.display()))?;
        }
        WriteMode::Atomic => write_atomic(path, content)?,
    }
    Ok(content.len() as u64)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let tmp_path = temp_sibling(path)?;
    if let Err(err) = fs::write(&tmp_path, contents) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("write temp file {}", tmp_path.display()));
    }
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("replace {}", path.display()));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .with_context(|| format!("path has no file name {}", path.display()))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(".{}.tmp", std::process::id()));
    Ok(path.with_file_name(tmp_name))
}
