//! Custom error types for the backup core.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown backup configuration: {0}")]
    UnknownBackup(String),

    #[error("Source path does not exist: {0}")]
    SourceNotFound(PathBuf),
}
