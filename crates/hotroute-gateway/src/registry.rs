// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin registry: the authoritative map from plugin file to mounted route.
//!
//! Each registered file owns exactly one route in the [`RouteTable`] plus its
//! endpoint metadata. Both are created, replaced, and removed together under
//! the registry lock.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use hotroute_core::{HealthStatus, HotrouteError, HttpMethod, PluginSource};
use hotroute_plugin::{parse_descriptor, HandlerCatalog};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::AuthConfig;
use crate::guard::PluginGuard;
use crate::metadata::{EndpointFilter, EndpointMetadata, PluginHealth, RegistryStats};
use crate::ratelimit::RateLimiter;
use crate::router::{RouteStackEntry, RouteTable};

/// Result of loading every plugin in the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub failed: usize,
}

/// What the registry holds for one plugin file.
struct PluginRecord {
    method: HttpMethod,
    path: String,
    guard: Arc<PluginGuard>,
    metadata: EndpointMetadata,
}

#[derive(Clone, Copy)]
enum LoadKind {
    Load,
    Reload,
}

impl LoadKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Reload => "reload",
        }
    }
}

/// Loads plugins from a source, mounts them, and answers introspection queries.
pub struct Registry {
    source: Arc<dyn PluginSource>,
    catalog: Arc<HandlerCatalog>,
    routes: Arc<RouteTable>,
    limiter: Arc<RateLimiter>,
    auth: AuthConfig,
    plugins: Mutex<HashMap<String, PluginRecord>>,
}

impl Registry {
    pub fn new(
        source: Arc<dyn PluginSource>,
        catalog: Arc<HandlerCatalog>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            source,
            catalog,
            routes: Arc::new(RouteTable::new()),
            limiter: Arc::new(RateLimiter::new()),
            auth,
            plugins: Mutex::new(HashMap::new()),
        }
    }

    /// The route table request dispatch reads from.
    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    pub fn source(&self) -> &Arc<dyn PluginSource> {
        &self.source
    }

    pub fn catalog(&self) -> &Arc<HandlerCatalog> {
        &self.catalog
    }

    /// Load every plugin file the source lists. One bad file never stops the rest.
    ///
    /// # Errors
    ///
    /// Returns an error only if the source itself cannot be listed.
    pub async fn load_all(&self) -> Result<LoadSummary, HotrouteError> {
        let files = self.source.list().await?;
        let mut summary = LoadSummary::default();
        for file in &files {
            if self.load(file).await {
                summary.loaded += 1;
            } else {
                summary.failed += 1;
            }
        }
        info!(
            location = %self.source.location(),
            loaded = summary.loaded,
            failed = summary.failed,
            "plugins loaded"
        );
        Ok(summary)
    }

    /// Read, validate, and mount one plugin file. Returns whether it is now registered.
    ///
    /// On failure nothing changes: a previously registered version of the
    /// file stays mounted.
    pub async fn load(&self, file: &str) -> bool {
        self.load_as(file, LoadKind::Load).await
    }

    /// Same as [`load`](Self::load), logged as a reload.
    pub async fn reload(&self, file: &str) -> bool {
        self.load_as(file, LoadKind::Reload).await
    }

    async fn load_as(&self, file: &str, kind: LoadKind) -> bool {
        let op = kind.as_str();
        match self.prepare(file).await {
            Ok(guard) => self.install(file, guard, op).await,
            Err(e) => {
                warn!(file = %file, op, error = %e, "plugin not registered");
                false
            }
        }
    }

    /// Build the guard for a file from its current on-disk descriptor.
    async fn prepare(&self, file: &str) -> Result<Arc<PluginGuard>, HotrouteError> {
        let text = self.source.read(file).await?;
        let descriptor = Arc::new(parse_descriptor(file, &text, &self.catalog)?);
        let handler = self.catalog.create(&descriptor.handler, &descriptor.options)?;

        if descriptor.authentication && self.auth.bearer_token.is_none() {
            warn!(
                file = %file,
                "plugin requires authentication but no bearer token is configured; all requests will be rejected"
            );
        }

        Ok(Arc::new(PluginGuard::new(
            descriptor,
            handler,
            self.auth.clone(),
            Arc::clone(&self.limiter),
        )?))
    }

    async fn install(&self, file: &str, guard: Arc<PluginGuard>, op: &str) -> bool {
        let mut plugins = self.plugins.lock().await;
        let previous = plugins.get(file).map(|r| (r.method, r.path.clone()));

        let entry = RouteStackEntry::new(file, Arc::clone(&guard));
        let (method, path) = (entry.method, entry.path.clone());
        let replaced = previous.as_ref().map(|(m, p)| (*m, p.as_str()));

        if let Err(e) = self.routes.replace(replaced, entry) {
            warn!(file = %file, op, error = %e, "plugin not registered");
            return false;
        }

        let metadata = EndpointMetadata::from_descriptor(guard.descriptor());
        plugins.insert(
            file.to_string(),
            PluginRecord {
                method,
                path: path.clone(),
                guard,
                metadata,
            },
        );

        match previous {
            Some((old_method, old_path)) => info!(
                file = %file,
                op,
                from = %format!("{old_method} {old_path}"),
                to = %format!("{method} {path}"),
                "plugin re-registered"
            ),
            None => info!(file = %file, op, method = %method, path = %path, "plugin registered"),
        }
        true
    }

    /// Remove a plugin's route and metadata. Returns whether anything was registered.
    pub async fn unregister(&self, file: &str) -> bool {
        let mut plugins = self.plugins.lock().await;
        let Some(record) = plugins.remove(file) else {
            debug!(file = %file, "unregister: nothing registered");
            return false;
        };
        self.routes.unmount(record.method, &record.path);
        info!(file = %file, method = %record.method, path = %record.path, "plugin unregistered");
        true
    }

    /// Endpoint metadata for one file, if registered.
    pub async fn get(&self, file: &str) -> Option<EndpointMetadata> {
        self.plugins
            .lock()
            .await
            .get(file)
            .map(|r| r.metadata.clone())
    }

    /// Registered endpoints matching `filter`, sorted by its sort field.
    pub async fn list_endpoints(&self, filter: &EndpointFilter) -> Vec<EndpointMetadata> {
        let snapshot: Vec<EndpointMetadata> = self
            .plugins
            .lock()
            .await
            .values()
            .map(|r| r.metadata.clone())
            .collect();
        filter.apply(snapshot)
    }

    /// Aggregate counts, recomputed on every call.
    pub async fn stats(&self) -> RegistryStats {
        let plugins = self.plugins.lock().await;
        RegistryStats::from_endpoints(plugins.values().map(|r| &r.metadata), self.routes.len())
    }

    /// Run every plugin's health check, one after another.
    pub async fn aggregate_health(&self) -> BTreeMap<String, PluginHealth> {
        let handlers: Vec<(String, Arc<PluginGuard>)> = self
            .plugins
            .lock()
            .await
            .iter()
            .map(|(file, r)| (file.clone(), Arc::clone(&r.guard)))
            .collect();

        let mut report = BTreeMap::new();
        for (file, guard) in handlers {
            let health = match guard.handler().health_check().await {
                Ok(HealthStatus::Healthy) => PluginHealth::ok(),
                Ok(HealthStatus::Degraded(message)) => PluginHealth::degraded(message),
                Ok(HealthStatus::Unhealthy(message)) => PluginHealth::error(message),
                Err(e) => PluginHealth::error(e.to_string()),
            };
            report.insert(file, health);
        }
        report
    }

    /// Number of registered plugins.
    pub async fn len(&self) -> usize {
        self.plugins.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.plugins.lock().await.is_empty()
    }
}
