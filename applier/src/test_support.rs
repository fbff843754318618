//! Test-only helpers for building payloads and inspecting target roots.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::apply::ApplyOptions;

/// One `<change>` block to render into a payload.
#[derive(Debug, Clone)]
pub struct TestChange {
    pub path: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
}

impl TestChange {
    pub fn new(path: &str, content: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            description: None,
            content: Some(content.to_string()),
        }
    }

    /// A block with content but no `<file>` element.
    pub fn without_path(content: &str) -> Self {
        Self {
            path: None,
            description: None,
            content: Some(content.to_string()),
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Render `<changes>` XML with content wrapped in CDATA.
pub fn payload(changes: &[TestChange]) -> String {
    let mut buf = String::from("<changes>\n");
    for change in changes {
        buf.push_str("  <change>\n");
        if let Some(path) = &change.path {
            buf.push_str(&format!("    <file>{}</file>\n", escape_text(path)));
        }
        if let Some(description) = &change.description {
            buf.push_str(&format!(
                "    <description>{}</description>\n",
                escape_text(description)
            ));
        }
        if let Some(content) = &change.content {
            buf.push_str(&format!("    <content>{}</content>\n", cdata(content)));
        }
        buf.push_str("  </change>\n");
    }
    buf.push_str("</changes>\n");
    buf
}

/// Wrap `text` in CDATA, splitting any `]]>` so it survives verbatim.
pub fn cdata(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Temporary target root that is removed on drop.
pub struct TestRoot {
    dir: TempDir,
}

impl TestRoot {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create tempdir")?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Default options rooted at this directory.
    pub fn options(&self) -> ApplyOptions {
        ApplyOptions::new(self.dir.path())
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.join(relative);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    /// Every file under the root as `(relative path, bytes)`, sorted by path.
    pub fn files(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(self.path()) {
            let entry = entry.context("walk test root")?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(self.path())
                .context("strip test root prefix")?
                .to_string_lossy()
                .replace('\\', "/");
            let bytes = fs::read(entry.path())
                .with_context(|| format!("read {}", entry.path().display()))?;
            files.push((relative, bytes));
        }
        files.sort();
        Ok(files)
    }
}
