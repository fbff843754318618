//! Preparing the directory every change resolves against.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::ApplyError;

/// Create `root` (and its parents) if missing. No-op when it already exists.
///
/// Failure here is fatal for the batch.
pub fn ensure_target_root(root: &Path) -> Result<(), ApplyError> {
    match fs::metadata(root) {
        Ok(metadata) if metadata.is_dir() => {
            debug!(root = %root.display(), "target root exists");
            return Ok(());
        }
        Ok(_) => {
            return Err(ApplyError::TargetRootNotDirectory {
                path: root.to_path_buf(),
            });
        }
        Err(_) => {}
    }

    fs::create_dir_all(root).map_err(|source| ApplyError::TargetRoot {
        path: root.to_path_buf(),
        source,
    })?;
    info!(root = %root.display(), "created target root");
    Ok(())
}
