//! Shared context for core operations.
//!
//! The original design kept the running-backup list behind global statics,
//! baking in a single-instance assumption. Here everything a core operation
//! needs travels in one explicit object that each process builds at startup.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::CoreConfig;
use crate::executor::JobExecutor;
use crate::journal::JobJournal;
use crate::observer::{ProgressView, RegistryObserver};
use crate::registry::RegistryStore;

pub struct BackupContext {
    pub config: CoreConfig,
    pub store: Arc<RegistryStore>,
    pub journal: Arc<JobJournal>,
}

impl BackupContext {
    pub fn new(config: CoreConfig) -> Self {
        let store = Arc::new(RegistryStore::new(config.registry.clone()));
        let journal = Arc::new(JobJournal::new(&config.journal));
        Self {
            config,
            store,
            journal,
        }
    }

    pub fn executor(&self) -> JobExecutor {
        JobExecutor::new(self.store.clone(), self.journal.clone())
    }

    pub fn observer(
        &self,
        catalog_file: PathBuf,
        view: Arc<dyn ProgressView>,
    ) -> RegistryObserver {
        RegistryObserver::new(&self.config.observer, self.store.clone(), catalog_file, view)
    }

    /// Startup recovery: reclaim partial artifacts left by processes that
    /// died mid-job, then drop their registry entries.
    pub async fn recover_stale_jobs(&self) {
        self.store.reclaim_all_terminated().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{JobDescriptor, NullSink};
    use crate::registry::JobStatus;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_context_wires_a_full_job() {
        let dir = TempDir::new().unwrap();
        let context = BackupContext::new(CoreConfig::with_data_dir(dir.path()));
        context.store.write(&[]).await;

        let source = dir.path().join("src");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("f.txt"), b"payload").unwrap();

        let job = JobDescriptor {
            backup_name: "Smoke".to_string(),
            source_root: source,
            destination_root: dir.path().join("dst"),
            compress: false,
            cancel: CancellationToken::new(),
        };

        let handle = context.executor().spawn(job, Arc::new(NullSink));
        let outcome = handle.await.unwrap().unwrap();

        assert!(outcome.fully_copied);
        assert_eq!(outcome.status, Some(JobStatus::Finished));

        // the journal recorded the copy
        let log = std::fs::read_to_string(dir.path().join("backup_events.log")).unwrap();
        assert!(log.lines().any(|l| l.starts_with("Copy file\t")));

        // terminal entries are cleaned up once consumed
        context.store.remove_all_finished_or_terminated().await;
        assert!(context.store.find("Smoke").await.is_none());
    }

    #[tokio::test]
    async fn test_recover_stale_jobs_sweeps_dead_process_leftovers() {
        let dir = TempDir::new().unwrap();
        let context = BackupContext::new(CoreConfig::with_data_dir(dir.path()));

        let leftover = dir.path().join("half-done");
        std::fs::create_dir_all(&leftover).unwrap();

        context
            .store
            .write(&[crate::registry::RegistryEntry {
                backup_name: "Crashed".to_string(),
                path: leftover.clone(),
                progress: 30,
                status: JobStatus::Progress,
            }])
            .await;

        context.recover_stale_jobs().await;

        assert!(!leftover.exists());
        assert!(context.store.find("Crashed").await.is_none());
    }
}
