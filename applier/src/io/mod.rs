//! I/O helpers for applier commands.

pub mod config;
pub mod materialize;
pub mod payload;
pub mod snapshot;
pub mod target_root;
pub mod writer;
