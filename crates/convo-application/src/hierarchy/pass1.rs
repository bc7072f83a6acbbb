//! Pass 1 — Extract & Index (spec §4.5.1).
//!
//! Instruction extraction itself happens once, in
//! [`crate::skeleton_builder`], when a skeleton is (re)built from its
//! transcripts — this keeps `child_task_instruction_prefixes` as the single
//! source of truth for "what did this task delegate". Pass 1's job is to
//! feed those already-extracted prefixes into a fresh `InstructionIndex`
//! (the index itself is never persisted — spec §5 calls it "recomputable
//! on demand") and to gate, via `phase1_complete`, which skeletons still
//! need a `phase1_complete` write: a skeleton already marked complete with
//! unchanged source-file checksums is a no-op for the idempotence
//! invariant (spec §8 invariant 6) even though its prefixes still feed the
//! index on every run.

use convo_domain::value_objects::TaskId;
use convo_domain::Skeleton;

use crate::instruction_index::InstructionIndex;

use super::HierarchyEngine;

/// A skeleton whose `phase1_complete` flag flipped this run and must be
/// persisted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pass1Update {
    /// The skeleton this update applies to.
    pub task_id: TaskId,
}

/// Counts and per-task failures from one Pass 1 run (spec §4.5.1 "Pass 1
/// output").
#[derive(Debug, Clone, Default)]
pub struct Pass1Report {
    /// Total skeletons considered.
    pub processed: usize,
    /// Skeletons that had at least one delegation instruction.
    pub parsed: usize,
    /// Total instructions inserted into the index this run.
    pub instructions_extracted: usize,
    /// Final `InstructionIndex` node count.
    pub index_size: usize,
    /// Task ids whose `phase1_complete` flag flipped and must be saved.
    pub errors: Vec<(TaskId, String)>,
}

/// Runs Pass 1 over `skeletons`, returning the freshly built index, the
/// report, and the set of skeletons whose `phase1_complete` needs to be
/// (re)written. `force_rebuild` bypasses the checksum-derived skip (spec
/// §4.5.3).
#[must_use]
pub fn run_pass1(
    _engine: &HierarchyEngine,
    skeletons: &[Skeleton],
    force_rebuild: bool,
) -> (InstructionIndex, Pass1Report, Vec<Pass1Update>) {
    let mut index = InstructionIndex::new();
    let mut report = Pass1Report::default();
    let mut updates = Vec::new();

    for skeleton in skeletons {
        report.processed += 1;

        if !skeleton.child_task_instruction_prefixes.is_empty() {
            report.parsed += 1;
        }

        for prefix in &skeleton.child_task_instruction_prefixes {
            let key = convo_domain::utils::text::truncate_chars(
                prefix,
                convo_domain::constants::INSTRUCTION_INDEX_KEY_CHARS,
            );
            index.insert(&key, skeleton.task_id.clone(), prefix.clone());
            report.instructions_extracted += 1;
        }

        let needs_write = force_rebuild || !skeleton.phase1_complete;
        if needs_write {
            updates.push(Pass1Update {
                task_id: skeleton.task_id.clone(),
            });
        }
    }

    report.index_size = index.len();
    (index, report, updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use convo_domain::entities::{SkeletonCounts, SourceFileChecksums};
    use convo_domain::IndexingState;

    fn skeleton(task_id: &str, prefixes: Vec<&str>, phase1_complete: bool) -> Skeleton {
        Skeleton {
            task_id: TaskId::new(task_id),
            parent_task_id: None,
            truncated_instruction: "do something".to_owned(),
            workspace: None,
            created_at: 0,
            last_activity: 0,
            counts: SkeletonCounts::default(),
            title: None,
            child_task_instruction_prefixes: prefixes.into_iter().map(str::to_owned).collect(),
            indexing_state: IndexingState::default(),
            data_source: format!("/tasks/{task_id}"),
            source_file_checksums: SourceFileChecksums::default(),
            phase1_complete,
            reconstructed_parent_id: None,
            parent_confidence_score: None,
            parent_resolution_method: None,
        }
    }

    #[test]
    fn indexes_every_prefix_and_flags_incomplete_skeletons() {
        let engine = HierarchyEngine::default();
        let skeletons = vec![
            skeleton("root", vec!["write a unit test for the parser"], false),
            skeleton("other", vec![], true),
        ];

        let (index, report, updates) = run_pass1(&engine, &skeletons, false);

        assert_eq!(report.processed, 2);
        assert_eq!(report.parsed, 1);
        assert_eq!(report.instructions_extracted, 1);
        assert_eq!(index.len(), 1);
        assert_eq!(updates, vec![Pass1Update { task_id: TaskId::new("root") }]);
    }

    #[test]
    fn second_run_with_no_changes_produces_no_updates() {
        let engine = HierarchyEngine::default();
        let skeletons = vec![skeleton("root", vec!["write a unit test"], true)];

        let (_, _, updates) = run_pass1(&engine, &skeletons, false);
        assert!(updates.is_empty());
    }

    #[test]
    fn force_rebuild_always_flags_every_skeleton() {
        let engine = HierarchyEngine::default();
        let skeletons = vec![skeleton("root", vec!["write a unit test"], true)];

        let (_, _, updates) = run_pass1(&engine, &skeletons, true);
        assert_eq!(updates.len(), 1);
    }
}
