//! The compact, indexable summary of one task (spec §3, §6).

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use super::indexing_state::IndexingState;
use crate::value_objects::TaskId;

/// SHA-256 checksums of the three transcript files at the time of the last
/// successful Pass 1 run, used to skip re-extraction when nothing changed
/// (spec §4.5.3).
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFileChecksums {
    /// Checksum of `task_metadata.json`, if present.
    pub metadata: Option<String>,
    /// Checksum of `api_conversation_history.json`, if present.
    pub api_history: Option<String>,
    /// Checksum of `ui_messages.json`, if present.
    pub ui_messages: Option<String>,
}

/// Counters summarizing a task's transcript (spec §3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonCounts {
    /// Total UI + API messages observed.
    pub messages: u64,
    /// Total tool/action invocations observed.
    pub actions: u64,
    /// Total bytes across the three transcript files.
    pub bytes: u64,
}

/// Compact summary of one task, the unit of work for both the Hierarchy
/// Engine and the Indexing Pipeline.
///
/// Invariant (spec §3): if `parent_task_id` is `Some` and resolves to a
/// skeleton in the set, then `created_at >= parent.created_at` and, when
/// both define a workspace, `workspace == parent.workspace`.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skeleton {
    /// Identity of the task this skeleton summarizes.
    pub task_id: TaskId,
    /// Parent asserted by the source (may be missing or stale on disk).
    pub parent_task_id: Option<TaskId>,
    /// Normalized, truncated (~200 char) first user message.
    pub truncated_instruction: String,
    /// Absolute workspace directory, if known.
    pub workspace: Option<String>,
    /// Unix millis when the task directory was created.
    pub created_at: i64,
    /// Unix millis of the most recent transcript activity.
    pub last_activity: i64,
    /// Message/action/byte counters.
    pub counts: SkeletonCounts,
    /// Optional human-readable title, when present in metadata.
    pub title: Option<String>,
    /// Ordered, deduplicated prefixes of sub-tasks this task delegated to.
    pub child_task_instruction_prefixes: Vec<String>,
    /// Current semantic-indexing state.
    pub indexing_state: IndexingState,
    /// Absolute path of the task directory this skeleton was built from.
    pub data_source: String,
    /// Checksums of the three transcript files as of the last Pass 1 run.
    pub source_file_checksums: SourceFileChecksums,
    /// Whether Pass 1 extraction has completed for the current checksums.
    pub phase1_complete: bool,
    /// Parent id assigned by the Hierarchy Engine, if `parent_task_id` was
    /// missing/stale and resolution succeeded.
    pub reconstructed_parent_id: Option<TaskId>,
    /// Confidence score of `reconstructed_parent_id`, in `[0, 1]`.
    pub parent_confidence_score: Option<f64>,
    /// Method that produced `reconstructed_parent_id`.
    pub parent_resolution_method: Option<super::reconstruction::ReconstructionMethod>,
}

impl Skeleton {
    /// The parent id to use for hierarchy purposes: the declared parent if
    /// present, otherwise the reconstructed one.
    #[must_use]
    pub fn effective_parent_id(&self) -> Option<&TaskId> {
        self.parent_task_id
            .as_ref()
            .or(self.reconstructed_parent_id.as_ref())
    }

    /// Whether this skeleton is missing (or has a stale/unresolvable)
    /// declared parent and is thus a Pass 2 candidate (spec §4.5.2).
    #[must_use]
    pub fn is_orphan(&self, known_task_ids: &std::collections::HashSet<TaskId>) -> bool {
        match &self.parent_task_id {
            None => true,
            Some(p) => !known_task_ids.contains(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Skeleton {
        Skeleton {
            task_id: TaskId::new("task-1"),
            parent_task_id: None,
            truncated_instruction: "refactor the payment retry loop".to_owned(),
            workspace: Some("/home/dev/project".to_owned()),
            created_at: 1_700_000_000_000,
            last_activity: 1_700_000_500_000,
            counts: SkeletonCounts {
                messages: 12,
                actions: 4,
                bytes: 4096,
            },
            title: Some("Retry loop refactor".to_owned()),
            child_task_instruction_prefixes: vec!["write a unit test for".to_owned()],
            indexing_state: IndexingState::default(),
            data_source: "/home/dev/.tasks/tasks/task-1".to_owned(),
            source_file_checksums: SourceFileChecksums::default(),
            phase1_complete: true,
            reconstructed_parent_id: None,
            parent_confidence_score: None,
            parent_resolution_method: None,
        }
    }

    #[test]
    fn round_trips_through_json() {
        let original = sample();
        let json = serde_json::to_string(&original).expect("serialize");
        let restored: Skeleton = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored.task_id, original.task_id);
        assert_eq!(
            restored.truncated_instruction,
            original.truncated_instruction
        );
        assert_eq!(restored.child_task_instruction_prefixes, original.child_task_instruction_prefixes);
        assert_eq!(restored.workspace, original.workspace);
        assert_eq!(restored.created_at, original.created_at);
    }

    #[test]
    fn effective_parent_id_prefers_declared_over_reconstructed() {
        let mut s = sample();
        s.reconstructed_parent_id = Some(TaskId::new("reconstructed"));
        assert_eq!(s.effective_parent_id().map(TaskId::as_str), Some("reconstructed"));

        s.parent_task_id = Some(TaskId::new("declared"));
        assert_eq!(s.effective_parent_id().map(TaskId::as_str), Some("declared"));
    }

    #[test]
    fn is_orphan_when_declared_parent_unknown() {
        let mut s = sample();
        s.parent_task_id = Some(TaskId::new("missing"));
        let known: std::collections::HashSet<TaskId> = [TaskId::new("task-1")].into_iter().collect();
        assert!(s.is_orphan(&known));

        s.parent_task_id = Some(TaskId::new("task-1"));
        let known: std::collections::HashSet<TaskId> =
            [TaskId::new("task-1")].into_iter().collect();
        assert!(!s.is_orphan(&known));
    }
}
