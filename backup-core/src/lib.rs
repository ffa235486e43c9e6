//! Backup Core Library
//!
//! Cross-process backup execution and coordination. Several independent OS
//! processes (an interactive front end, a headless scheduler) start, execute
//! and observe long-running copy/archive jobs while sharing one JSON registry
//! file as the only source of truth — no database, no OS file lock, no
//! network channel.

pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod fs;
pub mod journal;
pub mod logging;
pub mod observer;
pub mod registry;

// Re-export commonly used types
pub use config::CoreConfig;
pub use context::BackupContext;
pub use error::CoreError;
pub type Result<T> = std::result::Result<T, CoreError>;
