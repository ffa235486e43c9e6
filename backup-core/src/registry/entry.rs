//! Registry entry model and the job-status state machine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle status of a registry entry.
///
/// `Progress` is the only non-terminal state. A `Terminated` entry marks a
/// job that stopped before completion; its partial destination artifact must
/// be reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Progress,
    Finished,
    Terminated,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Terminated)
    }
}

/// One job entry as persisted in the shared registry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    /// Unique key among live entries
    pub backup_name: String,

    /// Destination artifact the job writes into
    pub path: PathBuf,

    /// Percent complete, 0-100
    pub progress: u8,

    pub status: JobStatus,
}

impl RegistryEntry {
    /// Entry for a freshly started job.
    pub fn started(backup_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            backup_name: backup_name.into(),
            path: path.into(),
            progress: 0,
            status: JobStatus::Progress,
        }
    }

    /// The same entry carrying a new progress value.
    pub fn at_progress(&self, progress: u8) -> Self {
        Self {
            progress: progress.min(100),
            ..self.clone()
        }
    }
}

/// Classify the status an incoming update should carry, given the previous
/// entry for the same name (if any).
///
/// One consistent rule set: reaching 100% finishes the job; a job already
/// Terminated cannot be resurrected by a stray late update; everything else,
/// including a brand-new registration, is a live job in progress. Only
/// completion finalization or an explicit interrupt produce `Terminated`.
pub fn next_status(previous: Option<JobStatus>, incoming_progress: u8) -> JobStatus {
    if incoming_progress >= 100 {
        JobStatus::Finished
    } else if previous == Some(JobStatus::Terminated) {
        JobStatus::Terminated
    } else {
        JobStatus::Progress
    }
}
