//! Configuration file watcher for hot reload.
//!
//! # Design Decisions
//! - Editors emit several modify events per save (truncate, write, chmod);
//!   they are coalesced and the file is read once writes go quiet
//! - The notify callback only signals; loading and validation run on a
//!   Tokio task
//! - A file that fails to load or validate leaves the current config in place

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::RouterConfig;

/// Quiet period after the last change event before the file is reloaded.
pub const SETTLE_DELAY: Duration = Duration::from_millis(250);

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouterConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. Must be called from within a Tokio runtime.
    ///
    /// The returned watcher must be kept alive for notifications to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (change_tx, change_rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let _ = change_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        tokio::spawn(reload_loop(self.path, change_rx, self.update_tx));
        Ok(watcher)
    }
}

async fn reload_loop(
    path: PathBuf,
    mut changes: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<RouterConfig>,
) {
    while settle(&mut changes, SETTLE_DELAY).await {
        tracing::info!(path = ?path, "Config file change detected, reloading");
        match load_config(&path) {
            Ok(new_config) => {
                if updates.send(new_config).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to reload config, keeping current configuration"
                );
            }
        }
    }
    tracing::debug!(path = ?path, "Config watcher stopped");
}

/// Wait for a change, then absorb further changes until none arrives for
/// `quiet`. Returns false once the change channel is closed.
async fn settle(changes: &mut mpsc::UnboundedReceiver<()>, quiet: Duration) -> bool {
    if changes.recv().await.is_none() {
        return false;
    }
    loop {
        match tokio::time::timeout(quiet, changes.recv()).await {
            Ok(Some(())) => continue,
            Ok(None) | Err(_) => return true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_of_changes_settles_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        for _ in 0..3 {
            tx.send(()).unwrap();
        }

        assert!(settle(&mut rx, Duration::from_millis(20)).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_late_change_extends_the_wait() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(()).unwrap();
        let sender = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let _ = sender.send(());
        });

        assert!(settle(&mut rx, Duration::from_millis(100)).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_channel_stops_the_loop() {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        drop(tx);
        assert!(!settle(&mut rx, Duration::from_millis(10)).await);
    }
}
