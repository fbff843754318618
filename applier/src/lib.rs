//! Change-set applier.
//!
//! Takes an XML payload describing whole-file changes and writes them under a
//! target root. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (payload parsing, path resolution,
//!   report types and rendering). No I/O.
//! - **[`io`]**: Side-effecting operations (directories, file writes, config,
//!   snapshots).
//!
//! [`apply`] coordinates both to run a batch. Whole-batch failures are
//! [`error::ApplyError`]; per-change failures live in the returned report.

pub mod apply;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
