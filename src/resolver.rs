//! Post-acquisition artifact discovery and finalization
//!
//! The extractor and transcoder decide the produced file's name and container,
//! so the result is attributed by diffing the shared directory before and after
//! the attempt. Files carrying this attempt's working prefix are preferred,
//! which keeps concurrent attempts from claiming each other's output.

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::naming::split_extension;
use crate::store::{ArtifactStore, is_already_exists};
use crate::types::{Artifact, DirectorySnapshot, WorkingName};

/// Maximum number of `_N` suffixes tried before giving up
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Identifies and finalizes the output of one acquisition attempt
#[derive(Clone, Debug)]
pub struct ArtifactResolver {
    convertible: Vec<String>,
    ignored_suffixes: Vec<String>,
}

impl ArtifactResolver {
    /// Create a resolver from configuration
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            convertible: config
                .convertible_extensions
                .iter()
                .map(|e| normalize_extension(e))
                .collect(),
            ignored_suffixes: config.ignored_suffixes.clone(),
        }
    }

    /// Extend the convertible set, e.g. with the extractor's declared extensions
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for ext in extensions {
            let ext = normalize_extension(ext.as_ref());
            if !ext.is_empty() && !self.convertible.contains(&ext) {
                self.convertible.push(ext);
            }
        }
        self
    }

    /// Whether files with `extension` may be renamed to the target extension
    pub fn is_convertible(&self, extension: &str) -> bool {
        self.convertible.contains(&normalize_extension(extension))
    }

    fn is_partial(&self, name: &str) -> bool {
        self.ignored_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    /// Identify the artifact produced between `before` and `after`.
    ///
    /// The returned artifact carries the target extension but not yet its
    /// final name; see [`ArtifactResolver::finalize`].
    ///
    /// # Errors
    ///
    /// - [`Error::NoNewFiles`] if the snapshots are identical
    /// - [`Error::UnresolvedOutput`] if new files exist but none qualifies
    pub async fn resolve(
        &self,
        store: &dyn ArtifactStore,
        before: &DirectorySnapshot,
        after: &DirectorySnapshot,
        working: &WorkingName,
        final_name: &str,
    ) -> Result<Artifact> {
        let new_files = after.created_since(before);
        if new_files.is_empty() {
            return Err(Error::NoNewFiles);
        }

        let complete: Vec<&String> = new_files.iter().filter(|n| !self.is_partial(n)).collect();
        let prefixed: Vec<&String> = complete
            .iter()
            .copied()
            .filter(|n| n.starts_with(working.prefix.as_str()))
            .collect();

        let candidates = if !prefixed.is_empty() {
            prefixed
        } else {
            // Extractor ignored the template. A concurrent attempt may have
            // finalized the same name meanwhile, so this is best effort.
            if complete.iter().any(|n| n.as_str() == final_name) {
                tracing::debug!(filename = %final_name, "final name produced directly");
                return artifact_for(store, final_name).await;
            }
            tracing::debug!(
                prefix = %working.prefix,
                new_files = new_files.len(),
                "no new file carries the working prefix, considering all new files"
            );
            complete
        };

        let target = normalize_extension(&working.target_extension);

        if let Some(name) = candidates
            .iter()
            .find(|n| split_extension(n).1.as_deref() == Some(target.as_str()))
        {
            return artifact_for(store, name).await;
        }

        let convertible = candidates.iter().find(|n| {
            split_extension(n)
                .1
                .is_some_and(|ext| self.convertible.contains(&ext))
        });

        if let Some(name) = convertible {
            let (stem, ext) = split_extension(name);
            let renamed = rename_unique(store, name, stem, &target).await?;
            tracing::info!(
                from = %name,
                to = %renamed,
                from_ext = ?ext,
                "renamed artifact to target extension"
            );
            return artifact_for(store, &renamed).await;
        }

        Err(Error::UnresolvedOutput { new_files })
    }

    /// Rename `artifact` to `final_name`, appending `_1`, `_2`, … before the
    /// extension while the name is taken. Never overwrites an existing file.
    pub async fn finalize(
        &self,
        store: &dyn ArtifactStore,
        artifact: &Artifact,
        final_name: &str,
    ) -> Result<Artifact> {
        let current = artifact.file_name();
        if current == final_name {
            return Ok(artifact.clone());
        }

        let (stem, ext) = split_final_name(final_name);
        let name = rename_unique(store, &current, stem, ext).await?;
        artifact_for(store, &name).await
    }
}

impl Default for ArtifactResolver {
    fn default() -> Self {
        Self::new(&ResolverConfig::default())
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Split a final name keeping the extension's original case
fn split_final_name(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (name, ""),
    }
}

fn numbered_name(stem: &str, ext: &str, n: u32) -> String {
    match (n, ext.is_empty()) {
        (0, true) => stem.to_string(),
        (0, false) => format!("{}.{}", stem, ext),
        (n, true) => format!("{}_{}", stem, n),
        (n, false) => format!("{}_{}.{}", stem, n, ext),
    }
}

/// Rename `from` to the first free `<stem>[_N].<ext>`.
///
/// Freedom is decided by the store's no-clobber rename rather than an
/// existence check, so two attempts racing for the same name both succeed.
async fn rename_unique(
    store: &dyn ArtifactStore,
    from: &str,
    stem: &str,
    ext: &str,
) -> Result<String> {
    for n in 0..=MAX_RENAME_ATTEMPTS {
        let candidate = numbered_name(stem, ext, n);
        if candidate == from {
            return Ok(candidate);
        }
        match store.rename(from, &candidate).await {
            Ok(()) => return Ok(candidate),
            Err(e) if is_already_exists(&e) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::Io(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!(
            "could not find a free name for {} after {} attempts",
            numbered_name(stem, ext, 0),
            MAX_RENAME_ATTEMPTS
        ),
    )))
}

async fn artifact_for(store: &dyn ArtifactStore, name: &str) -> Result<Artifact> {
    let stat = store.stat(name).await?;
    Ok(Artifact {
        path: store.path_of(name),
        size_bytes: stat.size_bytes,
        extension: split_extension(name).1.unwrap_or_default(),
    })
}
