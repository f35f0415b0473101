//! Traits and types for the shared artifact directory

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::SystemTime;

/// Readable handle on a stored artifact
pub type ArtifactReader = Pin<Box<dyn tokio::io::AsyncRead + Send>>;

/// Result of a `stat` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    /// Size in bytes
    pub size_bytes: u64,
    /// Last modification time
    pub modified: SystemTime,
}

/// The single flat directory shared by every acquisition, the sweeper and the
/// service boundary. Files are addressed by bare name only.
///
/// Implementations must not overwrite on [`rename`](ArtifactStore::rename):
/// an existing destination is reported as
/// [`std::io::ErrorKind::AlreadyExists`] so the caller can pick another name.
///
/// # Examples
///
/// ```no_run
/// use mediafetch::store::{ArtifactStore, FsStore};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = FsStore::new("./downloads").await?;
/// for name in store.list().await? {
///     let stat = store.stat(&name).await?;
///     println!("{} {} bytes", name, stat.size_bytes);
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Directory the store represents; handed to the extractor as its output dir
    fn root(&self) -> &Path;

    /// Full path of `name`
    fn path_of(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Names of all regular files currently present
    async fn list(&self) -> crate::Result<Vec<String>>;

    /// Size and modification time of `name`
    ///
    /// # Errors
    ///
    /// [`crate::Error::NotFound`] if `name` does not exist.
    async fn stat(&self, name: &str) -> crate::Result<FileStat>;

    /// Whether `name` exists
    async fn exists(&self, name: &str) -> crate::Result<bool>;

    /// Rename `from` to `to` without overwriting `to`
    async fn rename(&self, from: &str, to: &str) -> crate::Result<()>;

    /// Delete `name`
    ///
    /// # Errors
    ///
    /// [`crate::Error::NotFound`] if `name` does not exist.
    async fn delete(&self, name: &str) -> crate::Result<()>;

    /// Open `name` for reading
    ///
    /// The returned reader stays valid after `name` is deleted.
    async fn open(&self, name: &str) -> crate::Result<ArtifactReader>;

    /// Free space available to the store, if the backend can tell
    async fn available_space(&self) -> crate::Result<Option<u64>> {
        Ok(None)
    }

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

pub(crate) fn already_exists(to: &str) -> crate::Error {
    crate::Error::Io(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("{} already exists", to),
    ))
}

/// Whether `err` is the no-clobber rename failure
pub fn is_already_exists(err: &crate::Error) -> bool {
    matches!(err, crate::Error::Io(e) if e.kind() == std::io::ErrorKind::AlreadyExists)
}
