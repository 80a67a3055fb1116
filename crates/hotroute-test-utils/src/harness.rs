// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the host stack over a temporary plugin directory:
//! a [`DirectorySource`], a handler catalog with the built-ins plus the
//! [`MockHandlerFactory`], a [`Registry`], and the axum router. Requests go
//! through `tower::ServiceExt::oneshot`, so no socket is bound.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use hotroute_core::{HandlerFactory, HotrouteError};
use hotroute_gateway::{build_router, AuthConfig, GatewayState, LoadSummary, Registry};
use hotroute_plugin::{DirectorySource, HandlerCatalog};
use tower::ServiceExt;

use crate::mock_handler::{MockCounters, MockHandlerFactory};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    plugins: Vec<(String, String)>,
    bearer_token: Option<String>,
    factories: Vec<Arc<dyn HandlerFactory>>,
    trust_proxy_headers: bool,
    body_limit: Option<usize>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            plugins: Vec::new(),
            bearer_token: None,
            factories: Vec::new(),
            trust_proxy_headers: false,
            body_limit: None,
        }
    }

    /// Write a descriptor file into the plugin directory before loading.
    pub fn with_plugin(mut self, file: &str, descriptor: &str) -> Self {
        self.plugins.push((file.to_string(), descriptor.to_string()));
        self
    }

    /// Configure the shared bearer token.
    pub fn with_bearer_token(mut self, token: &str) -> Self {
        self.bearer_token = Some(token.to_string());
        self
    }

    /// Register an additional handler factory.
    pub fn with_factory(mut self, factory: Arc<dyn HandlerFactory>) -> Self {
        self.factories.push(factory);
        self
    }

    /// Derive client identity from `X-Forwarded-For`.
    pub fn with_trust_proxy_headers(mut self) -> Self {
        self.trust_proxy_headers = true;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = Some(limit);
        self
    }

    /// Build the harness and load every plugin in the directory.
    pub async fn build(self) -> Result<TestHarness, HotrouteError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| HotrouteError::io("tempdir", e))?;
        let plugin_dir = temp_dir.path().to_path_buf();

        for (file, descriptor) in &self.plugins {
            let path = plugin_dir.join(file);
            std::fs::write(&path, descriptor)
                .map_err(|e| HotrouteError::io(path.display().to_string(), e))?;
        }

        let mock = MockHandlerFactory::new();
        let mut catalog = HandlerCatalog::builtin();
        catalog.register(Arc::new(mock.clone()));
        for factory in self.factories {
            catalog.register(factory);
        }

        let registry = Arc::new(Registry::new(
            Arc::new(DirectorySource::new(&plugin_dir)),
            Arc::new(catalog),
            AuthConfig::new(self.bearer_token),
        ));
        let load_summary = registry.load_all().await?;

        let mut state = GatewayState::new(Arc::clone(&registry))
            .with_trust_proxy_headers(self.trust_proxy_headers);
        if let Some(limit) = self.body_limit {
            state = state.with_body_limit(limit);
        }

        Ok(TestHarness {
            registry,
            router: build_router(state),
            mock,
            load_summary,
            plugin_dir,
            _temp_dir: temp_dir,
        })
    }
}

/// A response collected from the router.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Raw body text.
    pub text: String,
    /// Body parsed as JSON (`Null` when empty, a string when not JSON).
    pub body: serde_json::Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A complete host environment over a temporary plugin directory.
pub struct TestHarness {
    /// Plugin registry backing the router.
    pub registry: Arc<Registry>,
    /// Host router with introspection routes and plugin dispatch.
    pub router: Router,
    /// Factory behind `handler = "mock"` descriptors.
    pub mock: MockHandlerFactory,
    /// Outcome of the initial load.
    pub load_summary: LoadSummary,
    plugin_dir: PathBuf,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// Counters shared by every mock handler.
    pub fn mock_counters(&self) -> &Arc<MockCounters> {
        self.mock.counters()
    }

    /// Write (or overwrite) a descriptor file. Does not reload it.
    pub fn write_plugin(&self, file: &str, descriptor: &str) {
        std::fs::write(self.plugin_dir.join(file), descriptor)
            .unwrap_or_else(|e| panic!("failed to write {file}: {e}"));
    }

    /// Delete a descriptor file. Does not unregister it.
    pub fn remove_plugin(&self, file: &str) {
        std::fs::remove_file(self.plugin_dir.join(file))
            .unwrap_or_else(|e| panic!("failed to remove {file}: {e}"));
    }

    /// Re-read a descriptor file, as the watcher does on change.
    pub async fn reload(&self, file: &str) -> bool {
        self.registry.reload(file).await
    }

    /// Send a GET request.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Request::get(uri).body(Body::empty()).expect("valid request"))
            .await
    }

    /// Send a request with a JSON body and an optional bearer token.
    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: &serde_json::Value,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.request(builder.body(Body::from(body.to_string())).expect("valid request"))
            .await
    }

    /// Send a request as if it arrived from `client`.
    pub async fn request_from(&self, client: SocketAddr, mut request: Request<Body>) -> TestResponse {
        request.extensions_mut().insert(ConnectInfo(client));
        self.request(request).await
    }

    /// Send an arbitrary request through the router.
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = if text.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| serde_json::Value::String(text.clone()))
        };
        TestResponse {
            status,
            headers,
            text,
            body,
        }
    }
}
