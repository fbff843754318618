//! Read-side snapshot of a target root.
//!
//! Concatenates every file under the root into one text document so it can be
//! handed to external tooling, the inverse direction of a batch apply.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::warn;
use walkdir::WalkDir;

const INSTRUCTION_HEADER: &str = "---User Instruction---";

/// One file included in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    /// `/`-separated path relative to the root.
    pub path: String,
    pub content: String,
}

/// Files under a root in path order, plus the ones that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub files: Vec<SnapshotFile>,
    pub skipped: Vec<(PathBuf, String)>,
}

impl Snapshot {
    /// Render `--- START OF FILE <path> ---` blocks separated by blank lines,
    /// optionally followed by an instruction section.
    pub fn render(&self, instruction: Option<&str>) -> String {
        let mut out = self
            .files
            .iter()
            .map(|file| format!("--- START OF FILE {} ---\n{}", file.path, file.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        if let Some(instruction) = instruction {
            out.push_str("\n\n");
            out.push_str(INSTRUCTION_HEADER);
            out.push('\n');
            out.push_str(instruction.trim());
        }
        out
    }
}

/// Walk `root` and collect every regular UTF-8 file.
pub fn collect_snapshot(root: &Path) -> Result<Snapshot> {
    if !root.is_dir() {
        return Err(anyhow!("target root {} does not exist", root.display()));
    }

    let mut snapshot = Snapshot::default();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let full_path = entry.path();
        let relative = relative_display(root, full_path)?;
        match fs::read_to_string(full_path) {
            Ok(content) => snapshot.files.push(SnapshotFile {
                path: relative,
                content,
            }),
            Err(err) => {
                warn!(path = %full_path.display(), error = %err, "skipping unreadable file");
                snapshot
                    .skipped
                    .push((full_path.to_path_buf(), err.to_string()));
            }
        }
    }
    snapshot.files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(snapshot)
}

fn relative_display(root: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(root)
        .with_context(|| format!("{} is outside {}", path.display(), root.display()))?;
    let segments: Vec<_> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect();
    Ok(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_files_in_path_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("src/components")).expect("mkdir");
        fs::write(root.join("src/components/App.tsx"), "app\n").expect("write");
        fs::write(root.join("index.html"), "<html></html>").expect("write");
        fs::write(root.join("src/main.ts"), "").expect("write");

        let snapshot = collect_snapshot(root).expect("snapshot");
        let paths: Vec<_> = snapshot.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["index.html", "src/components/App.tsx", "src/main.ts"]
        );
        assert_eq!(
            snapshot.render(None),
            "--- START OF FILE index.html ---\n<html></html>\n\n\
             --- START OF FILE src/components/App.tsx ---\napp\n\n\n\
             --- START OF FILE src/main.ts ---\n"
        );
    }

    #[test]
    fn appends_instruction_section() {
        let snapshot = Snapshot {
            files: vec![SnapshotFile {
                path: "a.txt".to_string(),
                content: "a".to_string(),
            }],
            skipped: Vec::new(),
        };
        assert_eq!(
            snapshot.render(Some(" make it blue \n")),
            "--- START OF FILE a.txt ---\na\n\n---User Instruction---\nmake it blue"
        );
    }

    #[test]
    fn non_utf8_files_are_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("logo.bin"), [0xff, 0xfe, 0x00]).expect("write");
        fs::write(temp.path().join("ok.txt"), "ok").expect("write");

        let snapshot = collect_snapshot(temp.path()).expect("snapshot");
        assert_eq!(snapshot.files.len(), 1);
        assert_eq!(snapshot.skipped.len(), 1);
        assert!(snapshot.skipped[0].0.ends_with("logo.bin"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = collect_snapshot(&temp.path().join("absent")).expect_err("missing");
        assert!(err.to_string().contains("does not exist"));
    }
}
