//! Configuration file watcher for hot reload.
//!
//! A reload replaces the whole [`Configuration`]; a compiled configuration is
//! never edited in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::compiled::Configuration;
use crate::config::loader::load_config;
use crate::config::SharedConfiguration;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Arc<Configuration>>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for compiled configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<Arc<Configuration>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!(path = ?path, "Config file change detected, recompiling");
                        reload(&path, &tx);
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn reload(path: &Path, tx: &mpsc::UnboundedSender<Arc<Configuration>>) {
    match load_config(path) {
        Ok(config) => {
            let _ = tx.send(Arc::new(config));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config. Keeping current configuration.");
        }
    }
}

/// Publish every received configuration into the shared snapshot.
///
/// Returns when the sending side is dropped.
pub async fn apply_updates(
    shared: SharedConfiguration,
    mut updates: mpsc::UnboundedReceiver<Arc<Configuration>>,
) {
    while let Some(config) = updates.recv().await {
        tracing::info!(backends = config.len(), "Configuration swapped");
        shared.store(config);
    }
}
