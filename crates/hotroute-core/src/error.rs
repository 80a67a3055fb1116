// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the hotroute plugin router.

use thiserror::Error;

/// The primary error type shared by the registry, handlers, and host.
#[derive(Debug, Error)]
pub enum HotrouteError {
    /// Configuration errors (invalid TOML, bad values, missing secrets).
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors while reading plugin sources or directories.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A plugin descriptor failed manifest validation.
    #[error("invalid plugin manifest `{file}`: {}", errors.join("; "))]
    ManifestInvalid { file: String, errors: Vec<String> },

    /// A route is already mounted by a different plugin file.
    #[error("route {method} {path} is already mounted by `{owner}`")]
    RouteConflict {
        method: String,
        path: String,
        owner: String,
    },

    /// A plugin handler failed while executing or constructing.
    #[error("handler error: {message}")]
    Handler {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Filesystem watcher could not be set up or failed at runtime.
    #[error("watcher error: {0}")]
    Watcher(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// HTTP server errors (bind failure, serve loop failure).
    #[error("server error: {message}")]
    Server {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HotrouteError {
    /// Shorthand for a handler error without an underlying source.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an `io::Error` with the path it occurred on.
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this is an `Io` error caused by a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
