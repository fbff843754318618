//! Stable exit codes for applier CLI commands.

/// Command completed. For `apply` this holds even when some changes were
/// skipped or failed.
pub const OK: i32 = 0;
/// Fatal error: unreadable or malformed payload, unusable target root, bad config.
pub const FATAL: i32 = 1;
