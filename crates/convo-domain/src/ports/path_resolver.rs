//! Path Resolver port (spec §4.1).

use async_trait::async_trait;

use crate::entities::StorageRoot;
use crate::error::Result;

/// Locates all storage roots for the host.
///
/// Implementations must return roots in a deterministic order
/// (alphabetical by resolved path) with the first entry marked primary,
/// and must drop any candidate whose `tasks/` subdirectory is missing.
#[async_trait]
pub trait PathResolver: Send + Sync {
    /// Resolve every storage root reachable on this host.
    async fn resolve_roots(&self) -> Result<Vec<StorageRoot>>;
}
