//! Explicit cache rebuild (spec §3: "never deleted except by explicit
//! cache rebuild"; spec §4.4's `rebuild(filter?)` operation): re-runs the
//! Skeleton Builder over every task directory under a storage root, or
//! only a filtered subset, straight from their transcript files, and
//! overwrites the cache with the result — bypassing whatever checksum or
//! `phase1_complete` state a task was already carrying.

use std::path::{Path, PathBuf};

use convo_application::{build_skeleton, BuildSkeletonInput};
use convo_domain::entities::Skeleton;
use convo_domain::error::{Error, Result};
use convo_domain::ports::{SkeletonRepository, TranscriptSource};
use convo_domain::value_objects::TaskId;
use walkdir::WalkDir;

use crate::repair::{checksums_of, directory_created_at_ms};

/// Rebuilds `filter`'s task ids (or every task directory under
/// `tasks_dir` when `filter` is `None`) and overwrites `repository` with
/// the result. Returns the number of skeletons rebuilt.
///
/// # Errors
///
/// Returns an error if `tasks_dir` cannot be read (whole-cache rebuild
/// only) or if the repository write fails.
pub async fn rebuild_cache<T, R>(
    tasks_dir: &Path,
    transcripts: &T,
    repository: &R,
    filter: Option<&[TaskId]>,
) -> Result<usize>
where
    T: TranscriptSource + ?Sized,
    R: SkeletonRepository + ?Sized,
{
    let task_dirs = match filter {
        Some(ids) => ids.iter().map(|id| tasks_dir.join(id.as_str())).collect(),
        None => list_task_dirs(tasks_dir).await?,
    };

    let mut skeletons = Vec::with_capacity(task_dirs.len());
    for task_dir in &task_dirs {
        if let Some(skeleton) = rebuild_one(task_dir, transcripts).await? {
            skeletons.push(skeleton);
        }
    }

    let count = skeletons.len();
    repository.rebuild(skeletons, filter).await?;
    Ok(count)
}

async fn rebuild_one(task_dir: &Path, transcripts: &(impl TranscriptSource + ?Sized)) -> Result<Option<Skeleton>> {
    let Some(task_id) = task_dir.file_name().and_then(|n| n.to_str()).map(TaskId::new) else {
        return Ok(None);
    };

    let metadata = transcripts.read_task_metadata(task_dir).await?;
    let api_history = transcripts.read_api_history(task_dir).await?;
    let ui_messages = transcripts.read_ui_messages(task_dir).await?;
    let fallback_created_at = directory_created_at_ms(task_dir).await;

    Ok(Some(build_skeleton(BuildSkeletonInput {
        task_id,
        data_source: task_dir.display().to_string(),
        metadata: &metadata,
        api_history: &api_history,
        ui_messages: &ui_messages,
        source_file_checksums: checksums_of(&metadata, &api_history, &ui_messages),
        fallback_created_at,
    })))
}

async fn list_task_dirs(tasks_dir: &Path) -> Result<Vec<PathBuf>> {
    let tasks_dir = tasks_dir.to_path_buf();
    let skeleton_cache_dirname = convo_domain::constants::SKELETON_CACHE_DIRNAME;

    tokio::task::spawn_blocking(move || {
        WalkDir::new(&tasks_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_dir() && entry.file_name() != skeleton_cache_dirname)
            .map(|entry| entry.path().to_path_buf())
            .collect::<Vec<_>>()
    })
    .await
    .map_err(|e| Error::io(format!("rebuild scan task panicked: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript_source::FilesystemTranscriptSource;
    use convo_domain::entities::IndexingState;
    use dashmap::DashMap;

    struct FakeRepository(DashMap<TaskId, Skeleton>);

    #[async_trait::async_trait]
    impl SkeletonRepository for FakeRepository {
        async fn get(&self, task_id: &TaskId) -> Option<Skeleton> {
            self.0.get(task_id).map(|e| e.value().clone())
        }
        async fn put(&self, skeleton: Skeleton) -> Result<()> {
            self.0.insert(skeleton.task_id.clone(), skeleton);
            Ok(())
        }
        async fn task_ids(&self) -> Vec<TaskId> {
            self.0.iter().map(|e| e.key().clone()).collect()
        }
        async fn snapshot(&self) -> Vec<Skeleton> {
            self.0.iter().map(|e| e.value().clone()).collect()
        }
        async fn rebuild(&self, skeletons: Vec<Skeleton>, filter: Option<&[TaskId]>) -> Result<()> {
            if filter.is_none() {
                self.0.clear();
            }
            for skeleton in skeletons {
                self.0.insert(skeleton.task_id.clone(), skeleton);
            }
            Ok(())
        }
    }

    fn stale_skeleton(task_id: &str) -> Skeleton {
        use convo_domain::entities::{SkeletonCounts, SourceFileChecksums};
        Skeleton {
            task_id: TaskId::new(task_id),
            parent_task_id: None,
            truncated_instruction: "stale instruction from a prior run".to_owned(),
            workspace: None,
            created_at: 0,
            last_activity: 0,
            counts: SkeletonCounts::default(),
            title: None,
            child_task_instruction_prefixes: vec![],
            indexing_state: IndexingState::default(),
            data_source: format!("/tasks/{task_id}"),
            source_file_checksums: SourceFileChecksums::default(),
            phase1_complete: true,
            reconstructed_parent_id: None,
            parent_confidence_score: None,
            parent_resolution_method: None,
        }
    }

    #[tokio::test]
    async fn whole_cache_rebuild_drops_entries_no_longer_on_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let tasks_dir = tmp.path().join("tasks");
        let task_dir = tasks_dir.join("task-1");
        tokio::fs::create_dir_all(&task_dir).await.unwrap();
        tokio::fs::write(
            task_dir.join(convo_domain::constants::UI_MESSAGES_FILENAME),
            serde_json::to_vec(&serde_json::json!([{"role": "user", "content": "rebuild me please"}])).unwrap(),
        )
        .await
        .unwrap();

        let repository = FakeRepository(DashMap::new());
        repository.put(stale_skeleton("task-1")).await.unwrap();
        repository.put(stale_skeleton("ghost-task")).await.unwrap();

        let transcripts = FilesystemTranscriptSource::new();
        let rebuilt = rebuild_cache(&tasks_dir, &transcripts, &repository, None).await.unwrap();

        assert_eq!(rebuilt, 1);
        assert!(repository.get(&TaskId::new("ghost-task")).await.is_none());
        let refreshed = repository.get(&TaskId::new("task-1")).await.unwrap();
        assert!(refreshed.truncated_instruction.contains("rebuild me please"));
    }

    #[tokio::test]
    async fn filtered_rebuild_leaves_other_cached_entries_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        let tasks_dir = tmp.path().join("tasks");
        let task_dir = tasks_dir.join("task-1");
        tokio::fs::create_dir_all(&task_dir).await.unwrap();
        tokio::fs::write(
            task_dir.join(convo_domain::constants::UI_MESSAGES_FILENAME),
            serde_json::to_vec(&serde_json::json!([{"role": "user", "content": "only this one"}])).unwrap(),
        )
        .await
        .unwrap();

        let repository = FakeRepository(DashMap::new());
        repository.put(stale_skeleton("task-1")).await.unwrap();
        repository.put(stale_skeleton("task-2")).await.unwrap();

        let transcripts = FilesystemTranscriptSource::new();
        let filter = vec![TaskId::new("task-1")];
        let rebuilt = rebuild_cache(&tasks_dir, &transcripts, &repository, Some(&filter)).await.unwrap();

        assert_eq!(rebuilt, 1);
        assert!(repository.get(&TaskId::new("task-2")).await.is_some(), "untouched by the filtered rebuild");
        let refreshed = repository.get(&TaskId::new("task-1")).await.unwrap();
        assert!(refreshed.truncated_instruction.contains("only this one"));
    }
}
