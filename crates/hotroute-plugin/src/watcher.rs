// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hot-reload file watcher for the plugin directory.
//!
//! ```text
//! filesystem events (notify)
//!   → keep Create / Modify / Remove
//!   → map to file identity (top-level *.toml only)
//!   → debounce per file identity
//!   → file still exists?  PluginChanged : PluginRemoved
//! ```
//!
//! The watcher only reports; the gateway decides what a change means.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hotroute_core::HotrouteError;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::descriptor::is_descriptor_path;

/// Default quiescence window before a changed file is reported.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Events emitted by the plugin watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A descriptor was created or modified and should be (re)loaded.
    PluginChanged { file: String },
    /// A descriptor is gone and its route should be unregistered.
    PluginRemoved { file: String },
    /// Watcher encountered a non-fatal error.
    Error(String),
}

/// Configuration for the plugin watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Plugin directory to watch.
    pub directory: PathBuf,
    /// Changes to one file within this window collapse into one event.
    pub debounce: Duration,
}

impl WatcherConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Watches the plugin directory and emits debounced [`WatchEvent`]s.
pub struct PluginWatcher {
    /// Canonical plugin directory; notify reports paths beneath it.
    directory: PathBuf,
    debounce: Duration,
    /// Dropping the notify handle stops filesystem monitoring.
    _watcher: RecommendedWatcher,
    raw_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    event_tx: mpsc::Sender<WatchEvent>,
}

impl PluginWatcher {
    /// Create a watcher and start monitoring the directory.
    ///
    /// Returns the watcher and a receiver for [`WatchEvent`]s. Call
    /// [`run()`](Self::run) to start the debounce loop.
    ///
    /// # Errors
    ///
    /// Returns [`HotrouteError::Watcher`] if the directory cannot be resolved
    /// or the platform watcher cannot be initialized.
    pub fn new(config: WatcherConfig) -> Result<(Self, mpsc::Receiver<WatchEvent>), HotrouteError> {
        let directory = std::fs::canonicalize(&config.directory).map_err(|e| {
            HotrouteError::Watcher(format!(
                "cannot resolve plugin directory {}: {e}",
                config.directory.display()
            ))
        })?;

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(64);

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = raw_tx.send(res);
            },
            notify::Config::default(),
        )
        .map_err(|e| HotrouteError::Watcher(format!("filesystem watcher: {e}")))?;

        watcher
            .watch(&directory, RecursiveMode::Recursive)
            .map_err(|e| {
                HotrouteError::Watcher(format!("cannot watch {}: {e}", directory.display()))
            })?;
        info!(path = %directory.display(), "watching plugin directory");

        Ok((
            Self {
                directory,
                debounce: config.debounce,
                _watcher: watcher,
                raw_rx,
                event_tx,
            },
            event_rx,
        ))
    }

    /// The canonical directory being watched.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Run the debounce loop until `cancel` fires, the notify channel closes,
    /// or the event receiver is dropped.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut pending: HashMap<String, tokio::time::Instant> = HashMap::new();

        loop {
            let next_deadline = pending.values().copied().min();

            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    debug!("plugin watcher cancelled");
                    break;
                }

                () = async {
                    match next_deadline {
                        Some(deadline) => tokio::time::sleep_until(deadline).await,
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    let now = tokio::time::Instant::now();
                    let ready: Vec<String> = pending
                        .iter()
                        .filter(|(_, deadline)| **deadline <= now)
                        .map(|(file, _)| file.clone())
                        .collect();

                    for file in ready {
                        pending.remove(&file);
                        if !self.emit_change(file).await {
                            return;
                        }
                    }
                }

                event = self.raw_rx.recv() => {
                    match event {
                        Some(Ok(ev)) => self.handle_raw_event(&ev, &mut pending),
                        Some(Err(e)) => {
                            warn!(error = %e, "filesystem watcher error");
                            if self.event_tx.send(WatchEvent::Error(e.to_string())).await.is_err() {
                                debug!("event receiver dropped, stopping watcher");
                                return;
                            }
                        }
                        None => {
                            debug!("filesystem watcher channel closed, stopping");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Reset the debounce timer of every descriptor touched by `event`.
    fn handle_raw_event(&self, event: &Event, pending: &mut HashMap<String, tokio::time::Instant>) {
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
            _ => return,
        }

        for path in &event.paths {
            let Some(file) = file_identity(&self.directory, path) else {
                debug!(path = %path.display(), "ignoring change outside plugin files");
                continue;
            };
            debug!(file = %file, kind = ?event.kind, "plugin file change detected");
            pending.insert(file, tokio::time::Instant::now() + self.debounce);
        }
    }

    /// Report a quiesced file. Returns `false` once the receiver is gone.
    async fn emit_change(&self, file: String) -> bool {
        let exists = tokio::fs::try_exists(self.directory.join(&file))
            .await
            .unwrap_or(false);

        let event = if exists {
            info!(file = %file, "plugin file changed");
            WatchEvent::PluginChanged { file }
        } else {
            info!(file = %file, "plugin file removed");
            WatchEvent::PluginRemoved { file }
        };

        if self.event_tx.send(event).await.is_err() {
            debug!("event receiver dropped, stopping watcher");
            return false;
        }
        true
    }
}

/// Map a changed path to a plugin file identity.
///
/// Only descriptor files directly inside `directory` have an identity;
/// anything in a subdirectory, hidden, or with another extension does not.
pub fn file_identity(directory: &Path, path: &Path) -> Option<String> {
    let parent = path.parent()?;
    if !parent.components().eq(directory.components()) || !is_descriptor_path(path) {
        return None;
    }
    path.file_name()?.to_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_for_top_level_descriptor() {
        let dir = Path::new("/srv/plugins");
        assert_eq!(
            file_identity(dir, Path::new("/srv/plugins/ping.toml")),
            Some("ping.toml".to_string())
        );
    }

    #[test]
    fn no_identity_for_nested_or_foreign_files() {
        let dir = Path::new("/srv/plugins");
        assert_eq!(file_identity(dir, Path::new("/srv/plugins/sub/ping.toml")), None);
        assert_eq!(file_identity(dir, Path::new("/srv/plugins/ping.toml.swp")), None);
        assert_eq!(file_identity(dir, Path::new("/srv/plugins/.ping.toml")), None);
        assert_eq!(file_identity(dir, Path::new("/srv/other/ping.toml")), None);
        assert_eq!(file_identity(dir, Path::new("/srv/plugins")), None);
    }

    #[test]
    fn trailing_separator_in_directory_is_ignored() {
        let dir = Path::new("/srv/plugins/");
        assert_eq!(
            file_identity(dir, Path::new("/srv/plugins/ping.toml")),
            Some("ping.toml".to_string())
        );
    }

    #[test]
    fn missing_directory_fails_setup() {
        let result = PluginWatcher::new(WatcherConfig::new("/definitely/not/here"));
        assert!(matches!(result, Err(HotrouteError::Watcher(_))));
    }

    #[test]
    fn config_builder() {
        let config = WatcherConfig::new("plugins").with_debounce(Duration::from_millis(50));
        assert_eq!(config.directory, PathBuf::from("plugins"));
        assert_eq!(config.debounce, Duration::from_millis(50));
        assert_eq!(WatcherConfig::new("p").debounce, DEFAULT_DEBOUNCE);
    }
}
