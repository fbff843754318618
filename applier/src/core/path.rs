//! Lexical resolution of declared change paths against the target root.
//!
//! Nothing here touches the filesystem; symlinks are not followed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How strictly declared paths are confined to the target root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathPolicy {
    /// Reject absolute paths and `..` segments that climb above the root.
    #[default]
    Contained,
    /// Join the declared path onto the root as-is.
    Permissive,
}

/// Why a declared path cannot be written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathRejection {
    #[error("path is empty")]
    Empty,
    #[error("absolute path '{0}' is not allowed")]
    Absolute(String),
    #[error("path '{0}' escapes the target root")]
    EscapesRoot(String),
    #[error("path '{0}' resolves to the target root itself")]
    IsRoot(String),
    #[error("path '{0}' ends with a separator and does not name a file")]
    NotAFile(String),
}

/// Split a declared path into normalized segments.
///
/// Accepts `/` and `\` as separators, drops `.` and empty segments and folds
/// `..` into its parent. A trailing separator names a directory and is
/// rejected.
pub fn normalize_segments(declared: &str) -> Result<Vec<&str>, PathRejection> {
    let trimmed = checked_file_path(declared)?;
    if is_absolute(trimmed) {
        return Err(PathRejection::Absolute(trimmed.to_string()));
    }

    let mut segments = Vec::new();
    for segment in trimmed.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(PathRejection::EscapesRoot(trimmed.to_string()));
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(PathRejection::IsRoot(trimmed.to_string()));
    }
    Ok(segments)
}

/// Map a declared path onto `root` according to `policy`.
pub fn resolve_target(
    root: &Path,
    declared: &str,
    policy: PathPolicy,
) -> Result<PathBuf, PathRejection> {
    match policy {
        PathPolicy::Contained => {
            let segments = normalize_segments(declared)?;
            Ok(segments
                .into_iter()
                .fold(root.to_path_buf(), |path, segment| path.join(segment)))
        }
        PathPolicy::Permissive => Ok(root.join(checked_file_path(declared)?)),
    }
}

/// Trimmed declared path, rejected when empty or ending in a separator.
fn checked_file_path(declared: &str) -> Result<&str, PathRejection> {
    let trimmed = declared.trim();
    if trimmed.is_empty() {
        return Err(PathRejection::Empty);
    }
    if trimmed.ends_with(['/', '\\']) {
        return Err(PathRejection::NotAFile(trimmed.to_string()));
    }
    Ok(trimmed)
}

/// Leading separator, or a drive prefix (`C:`) on Windows.
fn is_absolute(path: &str) -> bool {
    if path.starts_with(['/', '\\']) {
        return true;
    }
    cfg!(windows) && has_drive_prefix(path)
}

fn has_drive_prefix(path: &str) -> bool {
    let mut chars = path.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_nested_relative_path() {
        let resolved =
            resolve_target(Path::new("/work"), "src/components/App.tsx", PathPolicy::Contained)
                .expect("resolve");
        assert_eq!(resolved, Path::new("/work/src/components/App.tsx"));
    }

    #[test]
    fn normalizes_separators_and_dot_segments() {
        let segments = normalize_segments(r"src\.\lib//mod.rs").expect("normalize");
        assert_eq!(segments, vec!["src", "lib", "mod.rs"]);

        let segments = normalize_segments("a/b/../c.txt").expect("normalize");
        assert_eq!(segments, vec!["a", "c.txt"]);
    }

    #[test]
    fn rejects_paths_outside_root() {
        assert_eq!(
            normalize_segments("../secret.txt"),
            Err(PathRejection::EscapesRoot("../secret.txt".to_string()))
        );
        assert_eq!(
            normalize_segments("a/../../b"),
            Err(PathRejection::EscapesRoot("a/../../b".to_string()))
        );
        assert_eq!(
            normalize_segments("/etc/passwd"),
            Err(PathRejection::Absolute("/etc/passwd".to_string()))
        );
    }

    #[test]
    #[cfg(windows)]
    fn rejects_drive_prefix_on_windows() {
        assert_eq!(
            normalize_segments(r"C:\Windows\win.ini"),
            Err(PathRejection::Absolute(r"C:\Windows\win.ini".to_string()))
        );
    }

    #[test]
    #[cfg(not(windows))]
    fn colon_is_an_ordinary_file_name_character() {
        let segments = normalize_segments("a:b.txt").expect("normalize");
        assert_eq!(segments, vec!["a:b.txt"]);
        assert!(has_drive_prefix("a:b.txt"));
    }

    #[test]
    fn rejects_trailing_separator() {
        assert_eq!(
            normalize_segments("src/"),
            Err(PathRejection::NotAFile("src/".to_string()))
        );
        assert_eq!(
            normalize_segments(r"src\lib\"),
            Err(PathRejection::NotAFile(r"src\lib\".to_string()))
        );
        assert_eq!(
            resolve_target(Path::new("base"), "out/", PathPolicy::Permissive),
            Err(PathRejection::NotAFile("out/".to_string()))
        );
    }

    #[test]
    fn rejects_empty_and_root_paths() {
        assert_eq!(normalize_segments("  "), Err(PathRejection::Empty));
        assert_eq!(
            normalize_segments("a/.."),
            Err(PathRejection::IsRoot("a/..".to_string()))
        );
    }

    #[test]
    fn permissive_policy_keeps_traversal() {
        let resolved = resolve_target(Path::new("base"), "../up.txt", PathPolicy::Permissive)
            .expect("resolve");
        assert_eq!(resolved, Path::new("base").join("../up.txt"));
        assert_eq!(
            resolve_target(Path::new("base"), "", PathPolicy::Permissive),
            Err(PathRejection::Empty)
        );
    }
}
