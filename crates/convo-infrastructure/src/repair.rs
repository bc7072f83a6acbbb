//! Proactive Metadata Repair (spec §4.4): for every task directory under a
//! storage root that has transcript files but no `task_metadata.json`,
//! rebuild a skeleton from what's there and write the metadata back.
//! Bounded to a fixed concurrency (default 5, `RunnerConfig::repair_concurrency`)
//! so a storage root with thousands of orphaned directories doesn't open
//! thousands of files at once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use convo_application::{build_skeleton, BuildSkeletonInput};
use convo_domain::entities::SourceFileChecksums;
use convo_domain::error::Result;
use convo_domain::ports::{ParsedFile, SkeletonRepository, TranscriptSource};
use convo_domain::utils::id::compute_content_hash;
use convo_domain::value_objects::TaskId;
use tokio::sync::Semaphore;
use walkdir::WalkDir;

/// Outcome of one repair pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    /// Task directories found missing `task_metadata.json`.
    pub candidates: usize,
    /// Directories successfully repaired (metadata rebuilt and written).
    pub repaired: usize,
    /// Directories skipped because no transcript file existed to rebuild
    /// from (an empty or foreign directory, not an orphaned task).
    pub skipped_no_transcript: usize,
    /// Repair attempts that failed (logged, not fatal to the pass).
    pub failed: usize,
}

/// Scans `root`'s `tasks/` directory for task folders lacking
/// `task_metadata.json`, rebuilds and writes metadata for each one that
/// has at least one other transcript file present, and seeds the
/// skeleton cache with the rebuilt skeleton.
///
/// # Errors
///
/// Returns an error only if the root's `tasks/` directory cannot be read.
pub async fn repair_missing_metadata<T, R>(
    tasks_dir: &Path,
    transcripts: Arc<T>,
    repository: Arc<R>,
    concurrency: usize,
) -> Result<RepairReport>
where
    T: TranscriptSource + 'static,
    R: SkeletonRepository + 'static,
{
    let candidates = find_candidates(tasks_dir).await?;
    let total = candidates.len();
    if total == 0 {
        return Ok(RepairReport::default());
    }

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(total);

    for task_dir in candidates {
        let semaphore = Arc::clone(&semaphore);
        let transcripts = Arc::clone(&transcripts);
        let repository = Arc::clone(&repository);
        handles.push(tokio::task::spawn(async move {
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            repair_one(&task_dir, transcripts.as_ref(), repository.as_ref()).await
        }));
    }

    let mut report = RepairReport { candidates: total, ..RepairReport::default() };
    for handle in handles {
        match handle.await {
            Ok(Ok(true)) => report.repaired += 1,
            Ok(Ok(false)) => report.skipped_no_transcript += 1,
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "proactive metadata repair failed for a task");
                report.failed += 1;
            }
            Err(join_err) => {
                tracing::warn!(error = %join_err, "proactive metadata repair task panicked");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

/// Lists immediate subdirectories of `tasks_dir` that have no
/// `task_metadata.json`. The skeleton-cache directory itself is skipped.
async fn find_candidates(tasks_dir: &Path) -> Result<Vec<PathBuf>> {
    let tasks_dir = tasks_dir.to_path_buf();
    let skeleton_cache_dirname = convo_domain::constants::SKELETON_CACHE_DIRNAME;

    tokio::task::spawn_blocking(move || {
        let mut candidates = Vec::new();
        for entry in WalkDir::new(&tasks_dir).min_depth(1).max_depth(1).into_iter().filter_map(std::result::Result::ok)
        {
            if !entry.file_type().is_dir() {
                continue;
            }
            if entry.file_name() == skeleton_cache_dirname {
                continue;
            }
            let metadata_path = entry.path().join(convo_domain::constants::TASK_METADATA_FILENAME);
            if !metadata_path.exists() {
                candidates.push(entry.path().to_path_buf());
            }
        }
        candidates
    })
    .await
    .map_err(|e| convo_domain::error::Error::io(format!("repair scan task panicked: {e}")))
}

/// Rebuilds and writes metadata for one task directory. Returns `Ok(true)`
/// if metadata was rebuilt, `Ok(false)` if the directory had no transcript
/// file to rebuild from (so it's left untouched, not an error).
async fn repair_one(
    task_dir: &Path,
    transcripts: &(impl TranscriptSource + ?Sized),
    repository: &(impl SkeletonRepository + ?Sized),
) -> Result<bool> {
    let metadata = transcripts.read_task_metadata(task_dir).await?;
    let api_history = transcripts.read_api_history(task_dir).await?;
    let ui_messages = transcripts.read_ui_messages(task_dir).await?;

    if matches!(api_history, ParsedFile::Missing) && matches!(ui_messages, ParsedFile::Missing) {
        return Ok(false);
    }

    let task_id = task_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(TaskId::new)
        .ok_or_else(|| convo_domain::error::Error::invalid_argument("task directory has no usable name"))?;

    let fallback_created_at = directory_created_at_ms(task_dir).await;

    let skeleton = build_skeleton(BuildSkeletonInput {
        task_id,
        data_source: task_dir.display().to_string(),
        metadata: &metadata,
        api_history: &api_history,
        ui_messages: &ui_messages,
        source_file_checksums: checksums_of(&metadata, &api_history, &ui_messages),
        fallback_created_at,
    });

    let rebuilt_metadata = serde_json::json!({
        "title": skeleton.title,
        "workspace": skeleton.workspace,
        "created_at": skeleton.created_at,
        "parent_task_id": skeleton.parent_task_id.as_ref().map(convo_domain::value_objects::TaskId::as_str),
    });
    transcripts.write_task_metadata(task_dir, &rebuilt_metadata).await?;
    repository.put(skeleton).await?;
    Ok(true)
}

pub(crate) fn checksums_of(metadata: &ParsedFile, api_history: &ParsedFile, ui_messages: &ParsedFile) -> SourceFileChecksums {
    SourceFileChecksums {
        metadata: metadata.value().map(|v| compute_content_hash(&v.to_string())),
        api_history: api_history.value().map(|v| compute_content_hash(&v.to_string())),
        ui_messages: ui_messages.value().map(|v| compute_content_hash(&v.to_string())),
    }
}

pub(crate) async fn directory_created_at_ms(path: &Path) -> i64 {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        std::fs::metadata(&path)
            .and_then(|m| m.created().or_else(|_| m.modified()))
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_millis() as i64)
    })
    .await
    .unwrap_or(0)
}
