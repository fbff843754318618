//! Batch orchestration for `applier apply`.
//!
//! A batch is: parse the payload, make sure the target root exists, then for
//! each block in order resolve the path, create missing directories and write
//! the file. Only the first two steps can fail the batch; anything that goes
//! wrong for a single change is recorded in its [`ApplyResult`] and the loop
//! moves on. Already-written files are never rolled back.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::parser::parse_change_set;
use crate::core::path::{PathPolicy, resolve_target};
use crate::core::types::{ApplyResult, BatchReport, Change, ChangeBlock, ChangeSet};
use crate::error::ApplyError;
use crate::io::config::ApplierConfig;
use crate::io::materialize::ensure_parent_dirs;
use crate::io::target_root::ensure_target_root;
use crate::io::writer::{WriteMode, write_file};

/// Settings for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOptions {
    pub target_root: PathBuf,
    pub path_policy: PathPolicy,
    pub write_mode: WriteMode,
}

impl ApplyOptions {
    /// Contained paths, direct writes.
    pub fn new(target_root: impl Into<PathBuf>) -> Self {
        Self {
            target_root: target_root.into(),
            path_policy: PathPolicy::default(),
            write_mode: WriteMode::default(),
        }
    }

    pub fn from_config(cfg: &ApplierConfig) -> Self {
        Self {
            target_root: cfg.target_root.clone(),
            path_policy: cfg.path_policy(),
            write_mode: cfg.write_mode,
        }
    }
}

/// Parse `payload` and apply it under `options.target_root`.
///
/// A malformed payload is rejected before anything on disk changes, including
/// creation of the target root.
pub fn apply_payload(payload: &str, options: &ApplyOptions) -> Result<BatchReport, ApplyError> {
    let change_set = parse_change_set(payload)?;
    apply_change_set(&change_set, options)
}

/// Apply an already parsed change set, strictly in order.
pub fn apply_change_set(
    change_set: &ChangeSet,
    options: &ApplyOptions,
) -> Result<BatchReport, ApplyError> {
    ensure_target_root(&options.target_root)?;

    let root = options.target_root.as_path();
    let mut report = BatchReport::new(root);
    report.results.reserve(change_set.len());

    for (index, block) in change_set.blocks.iter().enumerate() {
        let result = match block {
            ChangeBlock::Skipped { path, reason } => {
                warn!(index, reason = %reason, "change skipped");
                ApplyResult::skipped(index, path.clone(), reason.clone())
            }
            ChangeBlock::Ready(change) => match apply_change(root, change, options) {
                Ok(bytes) => {
                    info!(index, path = %change.path, bytes, "applied change");
                    ApplyResult::success(index, &change.path)
                }
                Err(err) => {
                    let detail = format!("{err:#}");
                    warn!(index, path = %change.path, error = %detail, "change failed");
                    ApplyResult::failed(index, &change.path, detail)
                }
            },
        };
        report.results.push(result);
    }

    let summary = report.summary();
    info!(
        root = %root.display(),
        success = summary.success,
        skipped = summary.skipped,
        failed = summary.failed,
        "batch complete"
    );
    Ok(report)
}

/// Resolve → materialize → write for a single change. Returns bytes written.
fn apply_change(root: &Path, change: &Change, options: &ApplyOptions) -> Result<u64> {
    if let Some(description) = &change.description {
        debug!(path = %change.path, description = %description, "applying change");
    }
    let target = resolve_target(root, &change.path, options.path_policy)?;
    for dir in ensure_parent_dirs(&target)? {
        debug!(dir = %dir.display(), "created directory");
    }
    write_file(&target, &change.content, options.write_mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ApplyStatus;
    use crate::test_support::{TestChange, TestRoot, payload};

    #[test]
    fn applies_changes_and_reports_in_order() {
        let root = TestRoot::new().expect("root");
        let xml = payload(&[
            TestChange::new("index.html", "<h1>hi</h1>\n"),
            TestChange::new("src/app.ts", "export {};\n").description("entry point"),
        ]);

        let report = apply_payload(&xml, &root.options()).expect("apply");

        assert_eq!(
            report.statuses(),
            vec![ApplyStatus::Success, ApplyStatus::Success]
        );
        assert_eq!(report.results[1].path.as_deref(), Some("src/app.ts"));
        assert_eq!(root.read("index.html").expect("read"), "<h1>hi</h1>\n");
        assert_eq!(root.read("src/app.ts").expect("read"), "export {};\n");
    }

    #[test]
    fn traversal_is_failed_not_fatal() {
        let root = TestRoot::new().expect("root");
        let xml = payload(&[
            TestChange::new("../outside.txt", "nope"),
            TestChange::new("inside.txt", "yes"),
        ]);

        let report = apply_payload(&xml, &root.options()).expect("apply");

        assert_eq!(
            report.statuses(),
            vec![ApplyStatus::Failed, ApplyStatus::Success]
        );
        let detail = report.results[0].detail.as_deref().unwrap_or_default();
        assert!(detail.contains("escapes the target root"), "detail: {detail}");
        assert!(!root.path().parent().expect("parent").join("outside.txt").exists());
    }

    #[test]
    fn permissive_policy_allows_parent_segments() {
        let root = TestRoot::new().expect("root");
        let mut options = root.options();
        options.target_root = root.path().join("project");
        options.path_policy = PathPolicy::Permissive;
        let xml = payload(&[TestChange::new("../sibling.txt", "ok")]);

        let report = apply_payload(&xml, &options).expect("apply");

        assert_eq!(report.statuses(), vec![ApplyStatus::Success]);
        assert_eq!(root.read("sibling.txt").expect("read"), "ok");
    }

    #[test]
    fn malformed_payload_does_not_create_root() {
        let root = TestRoot::new().expect("root");
        let mut options = root.options();
        options.target_root = root.path().join("never-created");

        let err = apply_payload("<change><file>a</file></change>", &options)
            .expect_err("fatal");

        assert!(matches!(err, ApplyError::Format(_)));
        assert!(!options.target_root.exists());
    }

    #[test]
    fn atomic_mode_applies_same_content() {
        let root = TestRoot::new().expect("root");
        let mut options = root.options();
        options.write_mode = WriteMode::Atomic;
        let xml = payload(&[TestChange::new("deep/dir/file.txt", "atomic\n")]);

        let report = apply_payload(&xml, &options).expect("apply");

        assert_eq!(report.statuses(), vec![ApplyStatus::Success]);
        assert_eq!(root.read("deep/dir/file.txt").expect("read"), "atomic\n");
    }
}
