//! File-backed registry store.
//!
//! Approximates transactional shared state without a cross-process lock:
//! readers retry with randomized backoff while the file is missing, empty or
//! mid-overwrite, and writers rewrite the whole file so the registry always
//! parses as a valid array from a reader's perspective. Under heavy
//! contention the last successful writer wins and an update may be lost;
//! callers must tolerate that, it is part of the API contract.

use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::entry::{next_status, JobStatus, RegistryEntry};
use crate::config::RegistryConfig;

pub struct RegistryStore {
    file: PathBuf,
    policy: RegistryConfig,
    /// Serializes registry operations within this process only.
    lock: Mutex<()>,
}

impl RegistryStore {
    pub fn new(policy: RegistryConfig) -> Self {
        Self {
            file: policy.file.clone(),
            policy,
            lock: Mutex::new(()),
        }
    }

    /// Read every entry currently in the registry. Never errors: after
    /// exhausting the retry budget it logs and returns an empty list.
    pub async fn read_all(&self) -> Vec<RegistryEntry> {
        let _guard = self.lock.lock().await;
        self.read_with_retries().await
    }

    /// Locate a single entry by job name.
    pub async fn find(&self, backup_name: &str) -> Option<RegistryEntry> {
        self.read_all()
            .await
            .into_iter()
            .find(|e| e.backup_name == backup_name)
    }

    /// Insert or update one entry, classifying its status from the previous
    /// entry for the same name. Rewrites the full list.
    pub async fn upsert(&self, mut entry: RegistryEntry) {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_with_retries().await;

        let previous = entries
            .iter()
            .position(|e| e.backup_name == entry.backup_name);

        match previous {
            Some(idx) => {
                entry.status = next_status(Some(entries[idx].status), entry.progress);
                info!(
                    backup = %entry.backup_name,
                    status = ?entry.status,
                    progress = entry.progress,
                    "Registry entry updated"
                );
                entries[idx] = entry;
            }
            None => {
                entry.status = next_status(None, entry.progress);
                info!(
                    backup = %entry.backup_name,
                    status = ?entry.status,
                    "Registry entry created"
                );
                entries.push(entry);
            }
        }

        self.write_with_retries(&entries).await;
    }

    /// Overwrite the registry with the given entry set.
    pub async fn write(&self, entries: &[RegistryEntry]) {
        let _guard = self.lock.lock().await;
        self.write_with_retries(entries).await;
    }

    /// Drop the named entry if it reached a terminal status.
    pub async fn remove_finished_or_terminated(&self, backup_name: &str) {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_with_retries().await;
        entries.retain(|e| !(e.backup_name == backup_name && e.status.is_terminal()));
        self.write_with_retries(&entries).await;
    }

    /// Drop every entry that reached a terminal status. Idempotent.
    pub async fn remove_all_finished_or_terminated(&self) {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_with_retries().await;
        entries.retain(|e| !e.status.is_terminal());
        self.write_with_retries(&entries).await;
    }

    /// Reclaim the partial artifact of every entry that never reached 100%
    /// and drop those entries. Run at process startup to recover from
    /// processes that died mid-job.
    pub async fn reclaim_all_terminated(&self) {
        let _guard = self.lock.lock().await;
        let entries = self.read_with_retries().await;
        let mut kept = Vec::with_capacity(entries.len());

        for entry in entries {
            if entry.progress < 100 && reclaim_artifact(&entry.path).await {
                info!(backup = %entry.backup_name, path = %entry.path.display(), "Partial backup reclaimed");
            } else {
                kept.push(entry);
            }
        }

        self.write_with_retries(&kept).await;
    }

    /// Finalize a job after its loop ended: re-read the registry and mark the
    /// entry Finished when it shows 100%, otherwise mark it Terminated and
    /// delete its partial destination artifact right away.
    pub async fn finalize_completion(&self, backup_name: &str) -> Option<JobStatus> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_with_retries().await;

        let Some(idx) = entries.iter().position(|e| e.backup_name == backup_name) else {
            warn!(backup = %backup_name, "No registry entry to finalize");
            return None;
        };

        let status = if entries[idx].progress == 100 {
            entries[idx].status = JobStatus::Finished;
            JobStatus::Finished
        } else {
            entries[idx].status = JobStatus::Terminated;
            let artifact = entries[idx].path.clone();
            if reclaim_artifact(&artifact).await {
                info!(backup = %backup_name, path = %artifact.display(), "Partial backup deleted");
            }
            JobStatus::Terminated
        };

        info!(backup = %backup_name, status = ?status, "Backup finalized");
        self.write_with_retries(&entries).await;
        Some(status)
    }

    async fn read_with_retries(&self) -> Vec<RegistryEntry> {
        let attempts = self.policy.retry_attempts.max(1);

        for attempt in 1..=attempts {
            match tokio::fs::read(&self.file).await {
                Ok(bytes) if bytes.is_empty() => {
                    warn!(
                        "Registry file is empty, attempt {}/{}",
                        attempt, attempts
                    );
                }
                Ok(bytes) => match serde_json::from_slice::<Vec<RegistryEntry>>(&bytes) {
                    Ok(entries) => return entries,
                    Err(e) => {
                        // likely a concurrent writer mid-overwrite
                        warn!(
                            "Registry file is unparseable ({}), attempt {}/{}",
                            e, attempt, attempts
                        );
                    }
                },
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(
                        "Registry file does not exist yet, attempt {}/{}",
                        attempt, attempts
                    );
                }
                Err(e) => {
                    error!("Error reading registry file: {}", e);
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.policy.backoff()).await;
            }
        }

        error!(
            "Unable to read registry after {} attempts, treating as empty",
            attempts
        );
        Vec::new()
    }

    async fn write_with_retries(&self, entries: &[RegistryEntry]) {
        let json = match serde_json::to_vec_pretty(entries) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize registry entries: {}", e);
                return;
            }
        };

        let attempts = self.policy.retry_attempts.max(1);
        for attempt in 1..=attempts {
            match tokio::fs::write(&self.file, &json).await {
                Ok(()) => return,
                Err(e) => {
                    warn!(
                        "Attempt {}/{} to write registry failed: {}",
                        attempt, attempts, e
                    );
                }
            }

            if attempt < attempts {
                tokio::time::sleep(self.policy.backoff()).await;
            }
        }

        error!("Unable to write registry after {} attempts", attempts);
    }
}

/// Delete a destination artifact (directory tree or single file).
/// Returns true when the artifact is gone afterwards.
async fn reclaim_artifact(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            error!("Cannot inspect artifact {}: {}", path.display(), e);
            false
        }
        Ok(meta) => {
            let result = if meta.is_dir() {
                tokio::fs::remove_dir_all(path).await
            } else {
                tokio::fs::remove_file(path).await
            };
            match result {
                Ok(()) => true,
                Err(e) => {
                    error!("Failed to delete artifact {}: {}", path.display(), e);
                    false
                }
            }
        }
    }
}
