//! Registry observer.
//!
//! A per-process poller that reconciles the shared registry into a live
//! progress view. Jobs may have been started by a different process instance
//! (the headless scheduler, or an earlier run of the front end), so a plain
//! in-process callback is not enough: the observer re-reads the registry on a
//! fixed period and pushes what it finds into the presentation layer.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::catalog::Catalog;
use crate::config::ObserverConfig;
use crate::registry::RegistryStore;

/// Presentation-layer hook the observer renders into.
pub trait ProgressView: Send + Sync {
    /// A job known to this process is running at the given percent.
    fn show_running(&self, backup_name: &str, percent: u8);

    /// A job reached 100%; restore its normal rendering.
    fn show_idle(&self, backup_name: &str);
}

pub struct RegistryObserver {
    store: Arc<RegistryStore>,
    /// Definition list re-read each tick; the front end may edit it anytime
    catalog_file: PathBuf,
    view: Arc<dyn ProgressView>,
    period: Duration,
    cancel: CancellationToken,
}

impl RegistryObserver {
    pub fn new(
        config: &ObserverConfig,
        store: Arc<RegistryStore>,
        catalog_file: PathBuf,
        view: Arc<dyn ProgressView>,
    ) -> Self {
        Self {
            store,
            catalog_file,
            view,
            period: Duration::from_millis(config.poll_interval_ms),
            cancel: CancellationToken::new(),
        }
    }

    /// Spawn the polling task. The first tick runs immediately.
    pub fn start(&self) -> JoinHandle<()> {
        info!("Observer for running backups started");

        let store = self.store.clone();
        let catalog_file = self.catalog_file.clone();
        let view = self.view.clone();
        let cancel = self.cancel.clone();
        let mut interval = tokio::time::interval(self.period);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }

                // a failing tick must never stop the schedule
                if let Err(e) = tick(&store, &catalog_file, view.as_ref()).await {
                    error!("Observer tick failed: {}", e);
                }
            }
        })
    }

    /// Halt future ticks. The in-flight tick runs to its natural completion.
    pub fn stop(&self) {
        info!("Observer for running backups stopped");
        self.cancel.cancel();
    }
}

async fn tick(
    store: &RegistryStore,
    catalog_file: &Path,
    view: &dyn ProgressView,
) -> crate::Result<()> {
    let running = store.read_all().await;
    if running.is_empty() {
        return Ok(());
    }

    debug!("Observer found {} registry entries", running.len());
    let catalog = Catalog::load(catalog_file).await?;

    for entry in running {
        // entries without a locally-known configuration are not rendered
        if catalog.resolve(&entry.backup_name).is_none() {
            continue;
        }

        if entry.progress < 100 {
            view.show_running(&entry.backup_name, entry.progress);
        } else {
            view.show_idle(&entry.backup_name);
        }
    }

    Ok(())
}
