//! Shared types for change sets and batch reports.
//!
//! These types define the contract between the parser, the batch applier and
//! whoever presents the report. They carry no I/O handles.

use std::path::PathBuf;

use serde::Serialize;

/// One file the payload asks us to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    /// Declared path, trimmed, relative to the target root.
    pub path: String,
    /// Free-form note from the payload author. Never affects what is written.
    pub description: Option<String>,
    /// Exact file contents. May be empty.
    pub content: String,
}

/// A single `<change>` block as it came out of the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeBlock {
    /// Block is complete enough to apply.
    Ready(Change),
    /// Block could not become a [`Change`] (e.g. no path). Reported as skipped.
    Skipped {
        /// Path text if the block had one, even if unusable.
        path: Option<String>,
        reason: String,
    },
}

/// Ordered blocks extracted from one payload.
///
/// Order is application order: a later change to the same path wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub blocks: Vec<ChangeBlock>,
}

impl ChangeSet {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over the blocks that will actually be written.
    pub fn changes(&self) -> impl Iterator<Item = &Change> {
        self.blocks.iter().filter_map(|block| match block {
            ChangeBlock::Ready(change) => Some(change),
            ChangeBlock::Skipped { .. } => None,
        })
    }
}

/// Per-change outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyStatus {
    Success,
    Skipped,
    Failed,
}

impl ApplyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplyStatus::Success => "success",
            ApplyStatus::Skipped => "skipped",
            ApplyStatus::Failed => "failed",
        }
    }
}

/// Outcome for the block at `index` in the change set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyResult {
    pub index: usize,
    pub path: Option<String>,
    pub status: ApplyStatus,
    /// Diagnostic for skipped/failed entries, including the underlying cause.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApplyResult {
    pub fn success(index: usize, path: &str) -> Self {
        Self {
            index,
            path: Some(path.to_string()),
            status: ApplyStatus::Success,
            detail: None,
        }
    }

    pub fn skipped(index: usize, path: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            index,
            path,
            status: ApplyStatus::Skipped,
            detail: Some(reason.into()),
        }
    }

    pub fn failed(index: usize, path: &str, detail: impl Into<String>) -> Self {
        Self {
            index,
            path: Some(path.to_string()),
            status: ApplyStatus::Failed,
            detail: Some(detail.into()),
        }
    }
}

/// Ordered results for one batch run, index-aligned with the [`ChangeSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub target_root: PathBuf,
    pub results: Vec<ApplyResult>,
}

/// Count of results per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn new(target_root: impl Into<PathBuf>) -> Self {
        Self {
            target_root: target_root.into(),
            results: Vec::new(),
        }
    }

    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for result in &self.results {
            match result.status {
                ApplyStatus::Success => summary.success += 1,
                ApplyStatus::Skipped => summary.skipped += 1,
                ApplyStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// True if any change was skipped or failed.
    pub fn has_problems(&self) -> bool {
        self.results
            .iter()
            .any(|result| result.status != ApplyStatus::Success)
    }

    pub fn statuses(&self) -> Vec<ApplyStatus> {
        self.results.iter().map(|result| result.status).collect()
    }
}
