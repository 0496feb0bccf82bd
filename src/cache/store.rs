// ABOUTME: Backing stores for the HTTP cache: key-addressed byte blobs
// ABOUTME: Disk persistence via cacache plus an in-memory store for tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Campscout Authors

//! Cache backing stores.
//!
//! The store holds serialized [`super::Response`] blobs addressed by the
//! 64-byte keys from [`super::Request::key`]. Writes are key-independent, so
//! concurrent writes never conflict logically.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::errors::{AppError, AppResult};

/// Key-addressed blob storage shared across all providers and queries.
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the blob stored under `key`, if any.
    async fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>>;

    /// Write `value` under `key`, replacing any existing blob.
    async fn write(&self, key: &str, value: &[u8]) -> AppResult<()>;

    /// Remove every stored blob.
    async fn clear(&self) -> AppResult<()>;
}

/// Disk-backed store using a content-addressable cache directory.
#[derive(Debug, Clone)]
pub struct DiskStore {
    path: PathBuf,
}

impl DiskStore {
    /// Create a store rooted at `path`. The directory is created on first
    /// write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The platform cache directory for campscout.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error when the platform has no cache directory.
    pub fn default_path() -> AppResult<PathBuf> {
        dirs::cache_dir()
            .map(|d| d.join("campscout"))
            .ok_or_else(|| AppError::config("no user cache directory"))
    }

    /// The directory this store persists into.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Store for DiskStore {
    async fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        match cacache::read(&self.path, key).await {
            Ok(data) => Ok(Some(data)),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(e) => Err(AppError::cache_io(format!("read {key}: {e}"))),
        }
    }

    async fn write(&self, key: &str, value: &[u8]) -> AppResult<()> {
        cacache::write(&self.path, key, value)
            .await
            .map_err(|e| AppError::cache_io(format!("write {key}: {e}")))?;
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        cacache::clear(&self.path)
            .await
            .map_err(|e| AppError::cache_io(format!("clear: {e}")))
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no blobs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn read(&self, key: &str) -> AppResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn write(&self, key: &str, value: &[u8]) -> AppResult<()> {
        self.entries.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trip() -> AppResult<()> {
        let store = MemoryStore::new();
        assert_eq!(store.read("k").await?, None);

        store.write("k", b"value").await?;
        assert_eq!(store.read("k").await?, Some(b"value".to_vec()));

        store.clear().await?;
        assert!(store.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn disk_store_round_trip() -> AppResult<()> {
        let dir = tempfile::tempdir().map_err(|e| AppError::cache_io(e.to_string()))?;
        let store = DiskStore::new(dir.path());

        assert_eq!(store.read("GET_https_x_y").await?, None);
        store.write("GET_https_x_y", b"payload").await?;
        assert_eq!(
            store.read("GET_https_x_y").await?,
            Some(b"payload".to_vec())
        );

        store.write("GET_https_x_y", b"replaced").await?;
        assert_eq!(
            store.read("GET_https_x_y").await?,
            Some(b"replaced".to_vec())
        );
        Ok(())
    }
}
