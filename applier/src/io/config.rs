//! Applier configuration stored in `applier.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::path::PathPolicy;
use crate::io::writer::WriteMode;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "applier.toml";

/// Applier configuration (TOML).
///
/// Missing fields default to the values the CLI would use without a config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApplierConfig {
    /// Directory all change paths resolve against. Created if missing.
    pub target_root: PathBuf,

    /// `direct` (truncate in place) or `atomic` (temp file + rename).
    pub write_mode: WriteMode,

    /// Allow declared paths to leave `target_root` via `..` or absolute paths.
    pub allow_path_escape: bool,
}

impl Default for ApplierConfig {
    fn default() -> Self {
        Self {
            target_root: PathBuf::from("project"),
            write_mode: WriteMode::Direct,
            allow_path_escape: false,
        }
    }
}

impl ApplierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.target_root.as_os_str().is_empty() {
            return Err(anyhow!("target_root must not be empty"));
        }
        Ok(())
    }

    pub fn path_policy(&self) -> PathPolicy {
        if self.allow_path_escape {
            PathPolicy::Permissive
        } else {
            PathPolicy::Contained
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ApplierConfig::default()`.
pub fn load_config(path: &Path) -> Result<ApplierConfig> {
    if !path.exists() {
        let cfg = ApplierConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ApplierConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ApplierConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
