//! File system helpers for backup jobs.

pub mod walker;
