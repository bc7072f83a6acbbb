//! Skeleton Cache port (spec §4.4).

use async_trait::async_trait;

use crate::entities::Skeleton;
use crate::error::Result;
use crate::value_objects::TaskId;

/// Durable, keyed storage for skeletons, backed by one JSON file per task
/// id under `.skeletons/` (spec §4.4, §6). Implementations own the
/// in-memory `task_id -> Skeleton` map and must make `put` atomic
/// (temp-file + rename) so the cache is never left half-written.
#[async_trait]
pub trait SkeletonRepository: Send + Sync {
    /// Look up a skeleton by task id.
    async fn get(&self, task_id: &TaskId) -> Option<Skeleton>;

    /// Insert or overwrite a skeleton, persisting it atomically.
    async fn put(&self, skeleton: Skeleton) -> Result<()>;

    /// All task ids currently known to the cache.
    async fn task_ids(&self) -> Vec<TaskId>;

    /// A snapshot of every skeleton currently in the cache.
    async fn snapshot(&self) -> Vec<Skeleton>;

    /// Overwrites the cache with freshly rebuilt skeletons (spec §3: "never
    /// deleted except by explicit cache rebuild", spec §4.4's `rebuild(filter?)`
    /// operation). When `filter` is `Some`, only those task ids are
    /// replaced and everything else already cached is left untouched. When
    /// `filter` is `None`, the whole cache is cleared first, so a task id
    /// no longer present in `skeletons` does not linger from a previous
    /// rebuild.
    async fn rebuild(&self, skeletons: Vec<Skeleton>, filter: Option<&[TaskId]>) -> Result<()>;
}
