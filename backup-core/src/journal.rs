//! Append-only event journal.
//!
//! One plain-text line per directory-created / file-copied / error event,
//! formatted as `<action>\t<source>\t<destination>`. The journal is read back
//! by the history view outside the core; write failures are logged but never
//! abort a running job.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::error;

use crate::config::JournalConfig;

pub struct JobJournal {
    file: PathBuf,
    lock: Mutex<()>,
}

impl JobJournal {
    pub fn new(config: &JournalConfig) -> Self {
        Self {
            file: config.file.clone(),
            lock: Mutex::new(()),
        }
    }

    pub async fn directory_created(&self, source: &Path, destination: &Path) {
        self.record("Create directory", source, destination).await;
    }

    pub async fn file_copied(&self, source: &Path, destination: &Path) {
        self.record("Copy file", source, destination).await;
    }

    pub async fn copy_failed(&self, source: &Path, destination: &Path) {
        self.record("Copy failed", source, destination).await;
    }

    async fn record(&self, action: &str, source: &Path, destination: &Path) {
        let line = format!(
            "{}\t{}\t{}\n",
            action,
            source.display(),
            destination.display()
        );

        let _guard = self.lock.lock().await;
        let result = async {
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.file)
                .await?;
            file.write_all(line.as_bytes()).await?;
            file.flush().await
        }
        .await;

        if let Err(e) = result {
            error!("Failed to append to journal {}: {}", self.file.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_journal_appends_tab_separated_lines() {
        let dir = TempDir::new().unwrap();
        let journal = JobJournal::new(&JournalConfig {
            file: dir.path().join("events.log"),
        });

        journal
            .directory_created(Path::new("/src/photos"), Path::new("/dst/photos"))
            .await;
        journal
            .file_copied(Path::new("/src/photos/a.jpg"), Path::new("/dst/photos/a.jpg"))
            .await;
        journal
            .copy_failed(Path::new("/src/photos/b.jpg"), Path::new("/dst/photos/b.jpg"))
            .await;

        let content = tokio::fs::read_to_string(dir.path().join("events.log"))
            .await
            .unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Create directory\t/src/photos\t/dst/photos");
        assert_eq!(lines[1], "Copy file\t/src/photos/a.jpg\t/dst/photos/a.jpg");
        assert_eq!(lines[2], "Copy failed\t/src/photos/b.jpg\t/dst/photos/b.jpg");
    }

    #[tokio::test]
    async fn test_journal_write_failure_is_not_fatal() {
        let journal = JobJournal::new(&JournalConfig {
            file: PathBuf::from("/nonexistent-root/events.log"),
        });

        // must not panic
        journal
            .file_copied(Path::new("/src/a"), Path::new("/dst/a"))
            .await;
    }
}
