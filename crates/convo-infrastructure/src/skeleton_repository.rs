//! On-disk `SkeletonRepository` (spec §4.4): one JSON file per task id
//! under `.skeletons/`, loaded into an in-memory `DashMap` on construction,
//! written back atomically (temp file + rename), grounded on the teacher's
//! cache-adapter pattern generalized from key/value bytes to skeleton JSON
//! files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use convo_application::migrate_legacy_state;
use convo_domain::entities::Skeleton;
use convo_domain::error::{Error, Result};
use convo_domain::ports::SkeletonRepository;
use convo_domain::value_objects::TaskId;
use dashmap::DashMap;

/// A legacy on-disk skeleton shape that predates `IndexingState`: a bare
/// `qdrantIndexedAt` millisecond timestamp instead of the structured field.
#[derive(Debug, serde::Deserialize)]
struct LegacySkeletonTail {
    #[serde(rename = "qdrantIndexedAt")]
    qdrant_indexed_at: Option<i64>,
}

/// In-memory `task_id -> Skeleton` map backed by one JSON file per task
/// under `<primary_root>/tasks/.skeletons/`.
#[derive(Debug)]
pub struct JsonSkeletonRepository {
    dir: PathBuf,
    skeletons: DashMap<TaskId, Skeleton>,
}

impl JsonSkeletonRepository {
    /// Load every `*.json` file under `dir` into memory. Individual file
    /// failures are logged and skipped; the load never aborts (spec §4.4:
    /// "warn on individual failures but never abort the load").
    ///
    /// # Errors
    ///
    /// Returns an error only if `dir` cannot be created.
    pub async fn load(dir: PathBuf) -> Result<Self> {
        tokio::fs::create_dir_all(&dir).await?;

        let skeletons = DashMap::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match load_one(&path).await {
                Ok(skeleton) => {
                    skeletons.insert(skeleton.task_id.clone(), skeleton);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable skeleton file");
                }
            }
        }

        Ok(Self { dir, skeletons })
    }

    fn path_for(&self, task_id: &TaskId) -> PathBuf {
        self.dir.join(format!("{}.json", task_id.as_str()))
    }
}

#[async_trait]
impl SkeletonRepository for JsonSkeletonRepository {
    async fn get(&self, task_id: &TaskId) -> Option<Skeleton> {
        self.skeletons.get(task_id).map(|entry| entry.value().clone())
    }

    async fn put(&self, skeleton: Skeleton) -> Result<()> {
        let path = self.path_for(&skeleton.task_id);
        let bytes = serde_json::to_vec_pretty(&skeleton)?;
        write_atomic(&path, &bytes).await?;
        self.skeletons.insert(skeleton.task_id.clone(), skeleton);
        Ok(())
    }

    async fn task_ids(&self) -> Vec<TaskId> {
        self.skeletons.iter().map(|entry| entry.key().clone()).collect()
    }

    async fn snapshot(&self) -> Vec<Skeleton> {
        self.skeletons.iter().map(|entry| entry.value().clone()).collect()
    }

    async fn rebuild(&self, skeletons: Vec<Skeleton>, filter: Option<&[TaskId]>) -> Result<()> {
        if filter.is_none() {
            let stale: Vec<TaskId> = self.skeletons.iter().map(|entry| entry.key().clone()).collect();
            for task_id in stale {
                self.skeletons.remove(&task_id);
                match tokio::fs::remove_file(self.path_for(&task_id)).await {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }
        for skeleton in skeletons {
            self.put(skeleton).await?;
        }
        Ok(())
    }
}

/// Reads and deserializes one skeleton file, migrating the legacy
/// `qdrantIndexedAt` shape in place when `indexing_state` is absent (spec
/// §3 "Legacy migration"). The migrated decision (always a no-op Skip that
/// `requires_save`) is intentionally discarded here: `load` only needs the
/// migrated *state*, and the caller will naturally persist it again the
/// next time this skeleton round-trips through `put`.
async fn load_one(path: &Path) -> Result<Skeleton> {
    let raw = tokio::fs::read_to_string(path).await?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;

    if value.get("indexing_state").is_none() {
        if let Ok(legacy) = serde_json::from_value::<LegacySkeletonTail>(value.clone()) {
            if let Some(indexed_at) = legacy.qdrant_indexed_at {
                let mut skeleton: Skeleton = serde_json::from_value(value)
                    .map_err(|e| Error::malformed(path.display().to_string(), e.to_string()))?;
                // Legacy files carry no indexable-content hash; leaving it empty
                // just means the next pipeline tick sees "content changed" and
                // reindexes once, which is the correct and harmless outcome.
                let (state, _decision) = migrate_legacy_state(indexed_at, "");
                skeleton.indexing_state = state;
                return Ok(skeleton);
            }
        }
    }

    serde_json::from_value(value).map_err(|e| Error::malformed(path.display().to_string(), e.to_string()))
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Err(Error::invalid_argument("skeleton path has no parent directory"));
    };
    tokio::fs::create_dir_all(parent).await?;

    let tmp_path = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("skeleton"),
        uuid::Uuid::new_v4()
    ));
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}
