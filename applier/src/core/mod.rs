//! Deterministic, pure logic shared by the applier.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod parser;
pub mod path;
pub mod report;
pub mod types;
