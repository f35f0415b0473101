//! Shared artifact directory
//!
//! Every component reaches the shared directory through [`ArtifactStore`], so
//! the pipeline, the sweeper and the service boundary can be exercised against
//! [`MemoryStore`] as well as the real [`FsStore`].

mod fs;
mod memory;
mod traits;

pub use fs::FsStore;
pub use memory::MemoryStore;
pub use traits::{ArtifactReader, ArtifactStore, FileStat, is_already_exists};

use crate::types::DirectorySnapshot;

/// Capture the current listing of `store`
pub async fn snapshot(store: &dyn ArtifactStore) -> crate::Result<DirectorySnapshot> {
    Ok(DirectorySnapshot::new(store.list().await?))
}
