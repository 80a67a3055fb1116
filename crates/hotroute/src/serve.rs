// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `hotroute serve` command implementation.
//!
//! Loads every plugin descriptor, starts the directory watcher when hot
//! reload is enabled, and serves until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use hotroute_config::HotrouteConfig;
use hotroute_core::HotrouteError;
use hotroute_gateway::{spawn_hot_reload, start_server, AuthConfig, GatewayState, Registry, ServerConfig};
use hotroute_plugin::{DirectorySource, HandlerCatalog, WatcherConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs the `hotroute serve` command.
pub async fn run_serve(config: HotrouteConfig) -> Result<(), HotrouteError> {
    init_tracing(&config.logging.level);

    info!(directory = %config.plugins.directory, "starting hotroute serve");

    let registry = build_registry(&config);
    let summary = registry.load_all().await?;
    if summary.failed > 0 {
        warn!(failed = summary.failed, "some plugins were not registered; see earlier warnings");
    }

    let shutdown = install_signal_handler();

    let reload_task = if config.plugins.hot_reload {
        let watcher_config = WatcherConfig::new(&config.plugins.directory)
            .with_debounce(Duration::from_millis(config.plugins.debounce_ms));
        spawn_hot_reload(Arc::clone(&registry), watcher_config, shutdown.clone())
    } else {
        info!("hot reload disabled by configuration");
        None
    };

    let state = GatewayState::new(Arc::clone(&registry))
        .with_trust_proxy_headers(config.rate_limit.trust_proxy_headers)
        .with_body_limit(config.server.body_limit_bytes);
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let result = start_server(&server_config, state, shutdown.clone()).await;

    // Stop the watcher even when the server failed to start.
    shutdown.cancel();
    if let Some(task) = reload_task
        && let Err(e) = task.await
    {
        warn!(error = %e, "hot reload task ended abnormally");
    }

    info!("hotroute stopped");
    result
}

/// Builds the registry over the configured plugin directory with the built-in handlers.
pub fn build_registry(config: &HotrouteConfig) -> Arc<Registry> {
    Arc::new(Registry::new(
        Arc::new(DirectorySource::new(&config.plugins.directory)),
        Arc::new(HandlerCatalog::builtin()),
        AuthConfig::new(config.auth.bearer_token.clone()),
    ))
}

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is received.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => {
                            info!("received SIGINT (Ctrl+C), initiating shutdown");
                        }
                        _ = sigterm.recv() => {
                            info!("received SIGTERM, initiating shutdown");
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler; only Ctrl+C will stop the server");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "hotroute={log_level},hotroute_gateway={log_level},hotroute_plugin={log_level},tower_http=info,warn"
        ))
    });

    // try_init: a second call (e.g. from tests) is a no-op.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn build_registry_reads_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ping.toml"),
            "path = \"/ping\"\nhandler = \"echo\"\n",
        )
        .unwrap();

        let mut config = HotrouteConfig::default();
        config.plugins.directory = dir.path().display().to_string();
        let registry = build_registry(&config);
        let summary = registry.load_all().await.unwrap();
        assert_eq!(summary.loaded, 1);
        assert_eq!(registry.source().location(), dir.path().display().to_string());
    }
}
