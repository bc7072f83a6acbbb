//! External vector store contract (spec §4.7, §6).
//!
//! Narrowed from the teacher's richer `VectorStoreProvider` CRUD surface
//! (create/delete collection, search, list, get/delete by id) to exactly
//! the two operations the Indexing Pipeline needs — the rest of that
//! surface belongs to the out-of-scope embedding/search collaborator.

use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::{HostId, TaskId};

/// The content submitted for embedding and storage when a task is indexed.
#[derive(Debug, Clone)]
pub struct IndexableContent {
    /// Text content to embed (instruction + salient transcript excerpts).
    pub text: String,
    /// Hash of `text`, stored back onto the skeleton's `content_hash` on
    /// success so future Decision Service calls can detect drift.
    pub content_hash: String,
}

/// The external semantic-index collaborator (spec §6: "External vector
/// store contract").
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Submits `content` for embedding and storage under `task_id`.
    async fn index(&self, task_id: &TaskId, content: &IndexableContent) -> Result<()>;

    /// Returns how many indexed points are tagged with `host_id`.
    async fn count_points_by_host(&self, host_id: &HostId) -> Result<u64>;
}
