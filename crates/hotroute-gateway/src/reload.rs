// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hot reload: applies plugin directory changes to the registry.

use std::sync::Arc;

use hotroute_plugin::{PluginWatcher, WatchEvent, WatcherConfig};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::registry::Registry;

/// Start watching the plugin directory and apply every change to `registry`.
///
/// Returns `None` if the watcher cannot be set up; the host keeps serving the
/// plugins it already loaded.
pub fn spawn_hot_reload(
    registry: Arc<Registry>,
    config: WatcherConfig,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    let (watcher, mut events) = match PluginWatcher::new(config) {
        Ok(pair) => pair,
        Err(e) => {
            warn!(error = %e, "hot reload disabled");
            return None;
        }
    };

    info!(directory = %watcher.directory().display(), "hot reload enabled");

    let watch_cancel = cancel.clone();
    tokio::spawn(watcher.run(watch_cancel));

    Some(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => apply_event(&registry, event).await,
                    None => break,
                },
            }
        }
        info!("hot reload stopped");
    }))
}

/// Apply one watcher event to the registry.
pub async fn apply_event(registry: &Registry, event: WatchEvent) {
    match event {
        WatchEvent::PluginChanged { file } => {
            registry.reload(&file).await;
        }
        WatchEvent::PluginRemoved { file } => {
            registry.unregister(&file).await;
        }
        WatchEvent::Error(message) => {
            warn!(error = %message, "plugin watcher error");
        }
    }
}
