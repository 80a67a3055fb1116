// SPDX-FileCopyrightText: 2026 Hotroute Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory-backed plugin source.
//!
//! Every call goes to disk. Nothing is cached, so a reload always sees the
//! descriptor as it is stored right now.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hotroute_core::{HotrouteError, PluginSource};
use tracing::debug;

use crate::descriptor::is_descriptor_path;

/// Reads plugin descriptors from the top level of one directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory this source reads from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a file identity to its on-disk path.
    ///
    /// File identities are bare file names; anything with a path separator
    /// or a parent component is rejected.
    pub fn resolve(&self, file: &str) -> Result<PathBuf, HotrouteError> {
        let candidate = Path::new(file);
        let is_bare = candidate.file_name().and_then(|n| n.to_str()) == Some(file);
        if !is_bare || file.is_empty() {
            return Err(HotrouteError::Config(format!(
                "`{file}` is not a plugin file name"
            )));
        }
        Ok(self.dir.join(file))
    }
}

#[async_trait]
impl PluginSource for DirectorySource {
    fn location(&self) -> String {
        self.dir.display().to_string()
    }

    async fn list(&self) -> Result<Vec<String>, HotrouteError> {
        let location = self.location();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| HotrouteError::io(&location, e))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| HotrouteError::io(&location, e))?
        {
            let path = entry.path();
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if !is_file || !is_descriptor_path(&path) {
                debug!(path = %path.display(), "skipping non-plugin entry");
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(name.to_string());
            }
        }

        files.sort();
        Ok(files)
    }

    async fn read(&self, file: &str) -> Result<String, HotrouteError> {
        let path = self.resolve(file)?;
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| HotrouteError::io(path.display().to_string(), e))
    }

    async fn exists(&self, file: &str) -> bool {
        match self.resolve(file) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}
