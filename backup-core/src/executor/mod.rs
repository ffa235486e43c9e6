//! Backup job executor.
//!
//! Walks a source tree on a worker task, mirrors directories and copies (or
//! zstd-compresses) files into the destination, publishes progress to the
//! shared registry after every file, and honors cooperative cancellation
//! before each unit of work. Per-file failures are journaled and skipped;
//! files already copied are never rolled back.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::CoreError;
use crate::fs::walker::{count_files, walk_source, SourceItem};
use crate::journal::JobJournal;
use crate::registry::{JobStatus, RegistryEntry, RegistryStore};

/// Process-local description of one backup job. Never persisted.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    /// Name of the owning backup configuration
    pub backup_name: String,

    pub source_root: PathBuf,
    pub destination_root: PathBuf,

    /// Archive mode: compress each file with zstd instead of copying
    pub compress: bool,

    /// Cooperative cancellation, polled before each unit of work
    pub cancel: CancellationToken,
}

/// What a finished job loop reports back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// False when the job was interrupted or any file failed to copy
    pub fully_copied: bool,

    pub files_copied: u64,
    pub total_files: u64,

    /// Terminal registry status the finalization settled on
    pub status: Option<JobStatus>,
}

/// In-process progress sink, distinct from the cross-process registry.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, backup_name: &str, percent: u8);
}

impl<F> ProgressSink for F
where
    F: Fn(&str, u8) + Send + Sync,
{
    fn on_progress(&self, backup_name: &str, percent: u8) {
        self(backup_name, percent)
    }
}

/// Sink for callers that only consume the registry.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&self, _backup_name: &str, _percent: u8) {}
}

#[derive(Clone)]
pub struct JobExecutor {
    store: Arc<RegistryStore>,
    journal: Arc<JobJournal>,
}

impl JobExecutor {
    pub fn new(store: Arc<RegistryStore>, journal: Arc<JobJournal>) -> Self {
        Self { store, journal }
    }

    /// Run a job on a dedicated worker task, never the caller's thread.
    pub fn spawn(
        &self,
        job: JobDescriptor,
        sink: Arc<dyn ProgressSink>,
    ) -> JoinHandle<crate::Result<JobOutcome>> {
        let executor = self.clone();
        tokio::spawn(async move { executor.run(&job, sink).await })
    }

    /// Execute a backup job to completion, interruption, or best-effort end.
    pub async fn run(
        &self,
        job: &JobDescriptor,
        sink: Arc<dyn ProgressSink>,
    ) -> crate::Result<JobOutcome> {
        if tokio::fs::metadata(&job.source_root).await.is_err() {
            return Err(CoreError::SourceNotFound(job.source_root.clone()));
        }

        // Precompute the total unit count: files count 1, directories 0.
        let source = job.source_root.clone();
        let total_files = tokio::task::spawn_blocking(move || count_files(&source))
            .await
            .map_err(|e| std::io::Error::other(e))??;

        info!(
            backup = %job.backup_name,
            total_files,
            "Starting backup job"
        );

        tokio::fs::create_dir_all(&job.destination_root).await?;
        self.journal
            .directory_created(&job.source_root, &job.destination_root)
            .await;

        let entry = RegistryEntry::started(&job.backup_name, &job.destination_root);

        // Nothing to copy: publish 100% immediately.
        if total_files == 0 {
            self.store.upsert(entry.at_progress(100)).await;
            sink.on_progress(&job.backup_name, 100);
            let status = self.store.finalize_completion(&job.backup_name).await;
            return Ok(JobOutcome {
                fully_copied: true,
                files_copied: 0,
                total_files: 0,
                status,
            });
        }

        self.store.upsert(entry.clone()).await;

        let source = job.source_root.clone();
        let items = tokio::task::spawn_blocking(move || walk_source(&source))
            .await
            .map_err(|e| std::io::Error::other(e))??;

        let mut processed: u64 = 0;
        let mut fully_copied = true;
        let mut interrupted = false;

        for item in &items {
            if job.cancel.is_cancelled() {
                info!(backup = %job.backup_name, "Backup interrupted by user");
                interrupted = true;
                fully_copied = false;
                break;
            }

            if item.is_dir {
                if !self.mirror_directory(job, item).await {
                    fully_copied = false;
                }
                continue;
            }

            match self.transfer_file(job, item).await {
                Ok(destination) => {
                    self.journal.file_copied(&item.path, &destination).await;
                    processed += 1;

                    let percent = (processed * 100 / total_files) as u8;
                    self.store.upsert(entry.at_progress(percent)).await;
                    sink.on_progress(&job.backup_name, percent);
                }
                Err((destination, e)) => {
                    // best effort: skip the file, keep going
                    warn!(
                        backup = %job.backup_name,
                        file = %item.path.display(),
                        "Copy failed: {}", e
                    );
                    self.journal.copy_failed(&item.path, &destination).await;
                    fully_copied = false;
                }
            }
        }

        let status = self.store.finalize_completion(&job.backup_name).await;

        info!(
            backup = %job.backup_name,
            files_copied = processed,
            total_files,
            interrupted,
            "Backup job ended"
        );

        Ok(JobOutcome {
            fully_copied: fully_copied && !interrupted,
            files_copied: processed,
            total_files,
            status,
        })
    }

    /// Create the mirrored destination directory if absent.
    /// Returns false when the directory could not be created.
    async fn mirror_directory(&self, job: &JobDescriptor, item: &SourceItem) -> bool {
        let destination = job.destination_root.join(&item.relative_path);
        if let Ok(meta) = tokio::fs::metadata(&destination).await {
            if meta.is_dir() {
                return true;
            }
        }

        match tokio::fs::create_dir_all(&destination).await {
            Ok(()) => {
                self.journal
                    .directory_created(&item.path, &destination)
                    .await;
                true
            }
            Err(e) => {
                warn!(
                    backup = %job.backup_name,
                    dir = %destination.display(),
                    "Failed to create directory: {}", e
                );
                self.journal.copy_failed(&item.path, &destination).await;
                false
            }
        }
    }

    /// Copy or compress one file into the destination, overwriting.
    async fn transfer_file(
        &self,
        job: &JobDescriptor,
        item: &SourceItem,
    ) -> Result<PathBuf, (PathBuf, std::io::Error)> {
        let destination = if job.compress {
            let mut name = job.destination_root.join(&item.relative_path);
            name.as_mut_os_string().push(".zst");
            name
        } else {
            job.destination_root.join(&item.relative_path)
        };

        let result = if job.compress {
            compress_file(&item.path, &destination).await
        } else {
            tokio::fs::copy(&item.path, &destination).await.map(|_| ())
        };

        match result {
            Ok(()) => Ok(destination),
            Err(e) => Err((destination, e)),
        }
    }
}

/// Stream one file through a zstd encoder into its destination.
async fn compress_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    use async_compression::tokio::bufread::ZstdEncoder;
    use tokio::io::BufReader;

    let input = tokio::fs::File::open(source).await?;
    let mut encoder = ZstdEncoder::new(BufReader::new(input));
    let mut output = tokio::fs::File::create(destination).await?;

    tokio::io::copy(&mut encoder, &mut output).await?;
    output.sync_all().await
}
