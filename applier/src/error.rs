//! Errors that abort a whole batch.
//!
//! Per-change problems never surface here; they are recorded in the
//! [`BatchReport`](crate::core::types::BatchReport) instead.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::parser::FormatError;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("invalid change-set payload: {0}")]
    Format(#[from] FormatError),
    #[error("cannot create target root {}: {source}", path.display())]
    TargetRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("target root {} exists but is not a directory", path.display())]
    TargetRootNotDirectory { path: PathBuf },
}
