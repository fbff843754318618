//! Plain-text rendering of a [`BatchReport`].

use super::types::{ApplyResult, BatchReport};

/// Render one line per result followed by a summary line.
///
/// ```text
/// success  index.html
/// skipped  #2: missing <file> path
/// failed   a/b.txt: create directory ...: Not a directory
/// applied 1, skipped 1, failed 1 (root: project)
/// ```
pub fn render_report(report: &BatchReport) -> String {
    let mut lines: Vec<String> = report.results.iter().map(render_result).collect();
    let summary = report.summary();
    lines.push(format!(
        "applied {}, skipped {}, failed {} (root: {})",
        summary.success,
        summary.skipped,
        summary.failed,
        report.target_root.display()
    ));
    let mut buf = lines.join("\n");
    buf.push('\n');
    buf
}

fn render_result(result: &ApplyResult) -> String {
    let label = result
        .path
        .clone()
        .unwrap_or_else(|| format!("#{}", result.index + 1));
    let status = result.status.as_str();
    match &result.detail {
        Some(detail) => format!("{status:<8} {label}: {detail}"),
        None => format!("{status:<8} {label}"),
    }
}
