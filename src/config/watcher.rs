//! Configuration file watcher for hot reload.
//!
//! A reload is only delivered when the file text differs from the last
//! delivered text. Events that leave the content alone are dropped.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::parse_config;
use crate::config::schema::IndexConfig;

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<IndexConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated configurations.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<IndexConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file. Events arrive on the notify thread.
    ///
    /// The returned handle must be kept alive for as long as updates are wanted.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let mut delivered = fs::read_to_string(&path).ok();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        if let Some(new_config) = reload(&path, &mut delivered) {
                            let _ = tx.send(new_config);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

/// Read `path` and parse it if its text differs from `delivered`.
///
/// `delivered` only advances on a successful parse.
fn reload(path: &Path, delivered: &mut Option<String>) -> Option<IndexConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::error!(path = ?path, error = %e, "Failed to read config, keeping current generation");
            return None;
        }
    };

    if delivered.as_deref() == Some(content.as_str()) {
        tracing::debug!(path = ?path, "Config file unchanged, skipping reload");
        return None;
    }

    tracing::info!(path = ?path, "Config file change detected, reloading");
    match parse_config(&content) {
        Ok(config) => {
            *delivered = Some(content);
            Some(config)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current generation");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OLD: &str = "[[hosts]]\nname = \"old\"\nserver_names = [\"old.com\"]\n";
    const NEW: &str = "[[hosts]]\nname = \"new\"\nserver_names = [\"new.com\"]\n";

    #[test]
    fn test_unchanged_text_is_not_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.toml");
        std::fs::write(&path, OLD).unwrap();
        let mut delivered = Some(OLD.to_string());

        assert!(reload(&path, &mut delivered).is_none());

        std::fs::write(&path, NEW).unwrap();
        let config = reload(&path, &mut delivered).unwrap();
        assert_eq!(config.hosts[0].name, "new");
        assert!(reload(&path, &mut delivered).is_none());
    }

    #[test]
    fn test_reverting_a_broken_edit_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.toml");
        let mut delivered = Some(OLD.to_string());

        std::fs::write(&path, "[[hosts]\n").unwrap();
        assert!(reload(&path, &mut delivered).is_none());
        assert_eq!(delivered.as_deref(), Some(OLD));

        std::fs::write(&path, OLD).unwrap();
        assert!(reload(&path, &mut delivered).is_none());
    }

    #[tokio::test]
    async fn test_change_delivers_new_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.toml");
        std::fs::write(&path, OLD).unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _handle = watcher.run().unwrap();

        std::fs::write(&path, NEW).unwrap();

        // A truncate-then-write can surface an intermediate empty config first.
        let found = tokio::time::timeout(Duration::from_secs(10), async {
            while let Some(config) = updates.recv().await {
                if config.hosts.iter().any(|h| h.name == "new") {
                    return true;
                }
            }
            false
        })
        .await
        .unwrap_or(false);

        assert!(found, "watcher should deliver the rewritten config");
    }
}
