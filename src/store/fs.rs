//! Filesystem-backed artifact store

use super::traits::{ArtifactReader, ArtifactStore, FileStat, already_exists};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Artifact store over a local directory
///
/// Renames are no-clobber: the destination is hard-linked first (which fails
/// atomically if it exists) and the source unlinked afterwards. Filesystems
/// without hard links fall back to an existence check followed by a plain
/// rename.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create download directory '{}': {}",
                    root.display(),
                    e
                ),
            ))
        })?;
        Ok(Self { root })
    }

    fn not_found(name: &str) -> Error {
        Error::NotFound(format!("file {}", name))
    }

    fn map_missing(name: &str, e: std::io::Error) -> Error {
        if e.kind() == ErrorKind::NotFound {
            Self::not_found(name)
        } else {
            Error::Io(e)
        }
    }
}

#[async_trait]
impl ArtifactStore for FsStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            // files can disappear between read_dir and file_type (sweeper, serve)
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            } else {
                tracing::debug!(path = ?entry.path(), "skipping non UTF-8 file name");
            }
        }

        Ok(names)
    }

    async fn stat(&self, name: &str) -> Result<FileStat> {
        let metadata = tokio::fs::metadata(self.path_of(name))
            .await
            .map_err(|e| Self::map_missing(name, e))?;
        if !metadata.is_file() {
            return Err(Self::not_found(name));
        }

        Ok(FileStat {
            size_bytes: metadata.len(),
            modified: metadata.modified()?,
        })
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path_of(name)).await?)
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.path_of(from);
        let destination = self.path_of(to);

        match tokio::fs::hard_link(&source, &destination).await {
            Ok(()) => {
                tokio::fs::remove_file(&source).await?;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(already_exists(to)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Self::not_found(from)),
            Err(e) => {
                tracing::debug!(error = %e, "hard link unavailable, falling back to rename");
                if tokio::fs::try_exists(&destination).await? {
                    return Err(already_exists(to));
                }
                tokio::fs::rename(&source, &destination)
                    .await
                    .map_err(|e| Self::map_missing(from, e))
            }
        }
    }

    async fn delete(&self, name: &str) -> Result<()> {
        tokio::fs::remove_file(self.path_of(name))
            .await
            .map_err(|e| Self::map_missing(name, e))
    }

    async fn open(&self, name: &str) -> Result<ArtifactReader> {
        let file = tokio::fs::File::open(self.path_of(name))
            .await
            .map_err(|e| Self::map_missing(name, e))?;
        Ok(Box::pin(file))
    }

    async fn available_space(&self) -> Result<Option<u64>> {
        let root = self.root.clone();
        let space = tokio::task::spawn_blocking(move || get_available_space(&root))
            .await
            .map_err(|e| Error::DiskSpaceCheckFailed(e.to_string()))?
            .map_err(|e| Error::DiskSpaceCheckFailed(e.to_string()))?;
        Ok(Some(space))
    }

    fn name(&self) -> &'static str {
        "fs"
    }
}

/// Free bytes available to an unprivileged user on the filesystem holding `path`
fn get_available_space(path: &Path) -> std::io::Result<u64> {
    #[cfg(unix)]
    {
        use std::ffi::CString;
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidInput, e))?;

        // SAFETY: c_path is a valid NUL-terminated string, stat is zero-initialized
        // and only read after statvfs reports success.
        unsafe {
            let mut stat: libc::statvfs = std::mem::zeroed();
            if libc::statvfs(c_path.as_ptr(), &mut stat) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            #[allow(clippy::unnecessary_cast)]
            Ok((stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64))
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        use winapi::um::fileapi::GetDiskFreeSpaceExW;

        let wide_path: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        // SAFETY: wide_path is NUL-terminated and every out-pointer refers to a
        // live, aligned u64 that is only read after a successful call.
        unsafe {
            let mut free_bytes_available: u64 = 0;
            let mut total_bytes: u64 = 0;
            let mut total_free_bytes: u64 = 0;

            if GetDiskFreeSpaceExW(
                wide_path.as_ptr(),
                &mut free_bytes_available as *mut u64 as *mut _,
                &mut total_bytes as *mut u64 as *mut _,
                &mut total_free_bytes as *mut u64 as *mut _,
            ) == 0
            {
                return Err(std::io::Error::last_os_error());
            }

            Ok(free_bytes_available)
        }
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = path;
        Err(std::io::Error::new(
            ErrorKind::Unsupported,
            "Disk space checking is not supported on this platform",
        ))
    }
}
