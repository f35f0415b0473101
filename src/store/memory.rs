//! In-memory artifact store for tests and embedding

use super::traits::{ArtifactReader, ArtifactStore, FileStat, already_exists};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

#[derive(Debug, Clone)]
struct Entry {
    data: Arc<Vec<u8>>,
    modified: SystemTime,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, Entry>,
    undeletable: HashSet<String>,
    available_space: Option<u64>,
}

/// Artifact store held entirely in memory
///
/// The root path is nominal; nothing is ever written to it.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    root: PathBuf,
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("memory"),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // a poisoned map is still consistent; every mutation is a single insert/remove
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace `name` with `data`, modified now
    pub fn insert(&self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.insert_with_mtime(name, data, SystemTime::now());
    }

    /// Insert or replace `name` with an explicit modification time
    pub fn insert_with_mtime(
        &self,
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) {
        self.lock().files.insert(
            name.into(),
            Entry {
                data: Arc::new(data.into()),
                modified,
            },
        );
    }

    /// Change the modification time of an existing file
    pub fn set_modified(&self, name: &str, modified: SystemTime) -> Result<()> {
        let mut inner = self.lock();
        let entry = inner
            .files
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("file {}", name)))?;
        entry.modified = modified;
        Ok(())
    }

    /// Make every future `delete(name)` fail with a permission error
    pub fn deny_delete(&self, name: impl Into<String>) {
        self.lock().undeletable.insert(name.into());
    }

    /// Report `bytes` from [`ArtifactStore::available_space`]
    pub fn set_available_space(&self, bytes: Option<u64>) {
        self.lock().available_space = bytes;
    }

    /// Contents of `name`, if present
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().files.get(name).map(|e| e.data.as_ref().clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.lock().files.keys().cloned().collect())
    }

    async fn stat(&self, name: &str) -> Result<FileStat> {
        let inner = self.lock();
        let entry = inner
            .files
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("file {}", name)))?;
        Ok(FileStat {
            size_bytes: entry.data.len() as u64,
            modified: entry.modified,
        })
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.lock().files.contains_key(name))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.files.contains_key(to) {
            return Err(already_exists(to));
        }
        let entry = inner
            .files
            .remove(from)
            .ok_or_else(|| Error::NotFound(format!("file {}", from)))?;
        inner.files.insert(to.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.undeletable.contains(name) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("{} is not deletable", name),
            )));
        }
        inner
            .files
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("file {}", name)))
    }

    async fn open(&self, name: &str) -> Result<ArtifactReader> {
        let data = self
            .lock()
            .files
            .get(name)
            .map(|e| Arc::clone(&e.data))
            .ok_or_else(|| Error::NotFound(format!("file {}", name)))?;
        Ok(Box::pin(std::io::Cursor::new(data.as_ref().clone())))
    }

    async fn available_space(&self) -> Result<Option<u64>> {
        Ok(self.lock().available_space)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
