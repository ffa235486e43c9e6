//! Backup configuration catalog.
//!
//! The catalog is the user-edited list of backup definitions (name, paths,
//! schedule, notes, retention). It is owned by the front end; the core only
//! reads it to resolve a job name into concrete paths.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::CoreError;

/// How often an automatic backup recurs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleInterval {
    #[serde(default)]
    pub days: u32,
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
}

/// One user-defined backup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDefinition {
    pub name: String,
    pub source_path: PathBuf,
    pub destination_path: PathBuf,

    /// Recurrence for the headless scheduler; None means manual-only
    #[serde(default)]
    pub schedule: Option<ScheduleInterval>,

    /// When the scheduler should run this backup next
    #[serde(default)]
    pub next_run: Option<DateTime<Utc>>,

    #[serde(default)]
    pub notes: Option<String>,

    /// How many old backup artifacts to retain
    #[serde(default)]
    pub max_to_keep: Option<u32>,
}

/// Read-only view over the backup definition list.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    definitions: Vec<BackupDefinition>,
}

impl Catalog {
    pub fn new(definitions: Vec<BackupDefinition>) -> Self {
        Self { definitions }
    }

    /// Load the definition list from its JSON file.
    pub async fn load(path: &Path) -> crate::Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let definitions: Vec<BackupDefinition> = serde_json::from_str(&content)?;
        Ok(Self { definitions })
    }

    /// Resolve a job name into its definition.
    pub fn resolve(&self, name: &str) -> Option<&BackupDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Resolve a job name, erroring when it is unknown.
    pub fn require(&self, name: &str) -> crate::Result<&BackupDefinition> {
        self.resolve(name)
            .ok_or_else(|| CoreError::UnknownBackup(name.to_string()))
    }

    pub fn definitions(&self) -> &[BackupDefinition] {
        &self.definitions
    }
}
