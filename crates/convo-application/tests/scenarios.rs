//! End-to-end Hierarchy Engine scenarios run against an in-memory
//! `Skeleton` slice, no I/O involved.

use std::collections::HashSet;

use convo_application::{run_pass1, run_pass2, HierarchyEngine, Pass2Update};
use convo_domain::entities::{IndexingState, SkeletonCounts, SourceFileChecksums};
use convo_domain::value_objects::TaskId;
use convo_domain::Skeleton;

fn skeleton(
    task_id: &str,
    created_at: i64,
    instruction: &str,
    declared_parent: Option<&str>,
    children: Vec<&str>,
) -> Skeleton {
    Skeleton {
        task_id: TaskId::new(task_id),
        parent_task_id: declared_parent.map(TaskId::new),
        truncated_instruction: instruction.to_owned(),
        workspace: Some("/home/dev/project".to_owned()),
        created_at,
        last_activity: created_at,
        counts: SkeletonCounts::default(),
        title: None,
        child_task_instruction_prefixes: children.into_iter().map(str::to_owned).collect(),
        indexing_state: IndexingState::default(),
        data_source: format!("/tasks/{task_id}"),
        source_file_checksums: SourceFileChecksums::default(),
        phase1_complete: false,
        reconstructed_parent_id: None,
        parent_confidence_score: None,
        parent_resolution_method: None,
    }
}

fn resolve(update: &[Pass2Update], task_id: &str) -> Option<TaskId> {
    update
        .iter()
        .find(|u| u.task_id.as_str() == task_id)
        .and_then(|u| u.result.resolved_parent_id.clone())
}

/// Scenario A — a controlled seven-task tree: one root delegating to three
/// children, two of which each delegate to one grandchild. Every child's
/// `parent_task_id` is declared (no orphans), so Pass 2 should leave every
/// link untouched while Pass 1 still indexes every delegation.
#[test]
fn scenario_a_seven_task_hierarchy_round_trips_through_both_passes() {
    let root = skeleton(
        "root",
        1_000,
        "plan the Q3 migration",
        None,
        vec!["set up the staging cluster", "write the rollback runbook", "audit current usage"],
    );
    let child_a = skeleton("child-a", 1_100, "set up the staging cluster", Some("root"), vec!["provision the database"]);
    let child_b = skeleton("child-b", 1_200, "write the rollback runbook", Some("root"), vec!["draft the rollback steps"]);
    let child_c = skeleton("child-c", 1_300, "audit current usage", Some("root"), vec![]);
    let grandchild_a = skeleton("grandchild-a", 1_150, "provision the database", Some("child-a"), vec![]);
    let grandchild_b = skeleton("grandchild-b", 1_250, "draft the rollback steps", Some("child-b"), vec![]);
    let grandchild_c = skeleton("grandchild-c", 1_260, "an unrelated follow-up", Some("child-b"), vec![]);

    let skeletons =
        vec![root, child_a, child_b, child_c, grandchild_a, grandchild_b, grandchild_c];

    let engine = HierarchyEngine::default();
    let (index, pass1_report, _pass1_updates) = run_pass1(&engine, &skeletons, false);
    assert_eq!(pass1_report.processed, skeletons.len());
    assert_eq!(pass1_report.instructions_extracted, 5);
    assert!(pass1_report.errors.is_empty());

    let (pass2_updates, pass2_report) = run_pass2(&engine, &skeletons, &index);
    // Every task except the root declares a known parent, so only the root
    // itself is a Pass 2 candidate — and nothing in this tree delegates to
    // it, so it stays unresolved rather than spuriously attaching a parent.
    assert_eq!(pass2_report.processed, 1);
    assert_eq!(pass2_report.resolved, 0);
    let root_update = pass2_updates.iter().find(|u| u.task_id.as_str() == "root").unwrap();
    assert!(root_update.result.resolved_parent_id.is_none());
}

/// Scenario B — orphan rescue. Out of 100 skeletons, 47 declare no parent
/// but each has a `truncated_instruction` that verbatim-matches another
/// task's recorded `child_task_instruction_prefixes`. Every one must
/// resolve via `exact` or `prefix` with confidence >= 0.5, and none may be
/// assigned a parent whose `created_at` is later than its own.
#[test]
fn scenario_b_orphan_rescue_at_scale() {
    let mut skeletons = Vec::with_capacity(101);

    // A declared root anchor so the 53 "parent" tasks aren't themselves
    // Pass 2 candidates — only the 47 deliberately undeclared orphans are.
    skeletons.push(skeleton("top", 500, "kick off the quarter's workstreams", None, vec![]));

    for i in 0..53 {
        skeletons.push(skeleton(
            &format!("parent-{i}"),
            1_000 + i as i64,
            &format!("own work item number {i}"),
            Some("top"),
            vec![&format!("delegated subtask body number {i}")],
        ));
    }
    for i in 0..47 {
        skeletons.push(skeleton(
            &format!("orphan-{i}"),
            2_000 + i as i64,
            &format!("delegated subtask body number {i}"),
            None,
            vec![],
        ));
    }

    let engine = HierarchyEngine::default();
    let (index, _pass1_report, _updates) = run_pass1(&engine, &skeletons, false);
    let (pass2_updates, pass2_report) = run_pass2(&engine, &skeletons, &index);

    // "top" is also a Pass 2 candidate (no declared parent), so processed
    // is 47 orphans + the root anchor itself.
    assert_eq!(pass2_report.processed, 48);
    assert_eq!(pass2_report.resolved, 47);

    let by_id: std::collections::HashMap<_, _> =
        skeletons.iter().map(|s| (s.task_id.clone(), s)).collect();

    for i in 0..47 {
        let orphan_id = format!("orphan-{i}");
        let resolved = resolve(&pass2_updates, &orphan_id).unwrap_or_else(|| panic!("{orphan_id} should resolve"));
        assert_eq!(resolved.as_str(), format!("parent-{i}"));

        let update = pass2_updates.iter().find(|u| u.task_id.as_str() == orphan_id).unwrap();
        assert!(
            matches!(
                update.result.method,
                convo_domain::entities::ReconstructionMethod::Exact
                    | convo_domain::entities::ReconstructionMethod::Prefix
            ),
            "expected exact/prefix method for {orphan_id}, got {:?}",
            update.result.method
        );
        assert!(update.result.confidence_score >= 0.5);

        let parent = by_id[&resolved];
        let orphan = by_id[&TaskId::new(&orphan_id)];
        assert!(parent.created_at <= orphan.created_at, "no orphan may resolve to a later-created parent");
    }
}

/// Scenario C — cycle resistance. X declares no parent but its instruction
/// matches one of Y's delegated prefixes, and Y's instruction matches one
/// of X's delegated prefixes. Accepting both links would form a 2-cycle;
/// at most one may be accepted.
#[test]
fn scenario_c_mutual_delegation_accepts_at_most_one_link() {
    let x = skeleton("x", 1_000, "handle the shared queue cleanup", None, vec!["handle the shared queue setup"]);
    let y = skeleton("y", 2_000, "handle the shared queue setup", None, vec!["handle the shared queue cleanup"]);
    let skeletons = vec![x, y];

    let engine = HierarchyEngine::default();
    let (index, _report, _updates) = run_pass1(&engine, &skeletons, false);
    let (pass2_updates, pass2_report) = run_pass2(&engine, &skeletons, &index);

    let accepted = pass2_updates.iter().filter(|u| u.result.resolved_parent_id.is_some()).count();
    assert!(accepted <= 1, "at most one of the two mutually-matching links may be accepted, got {accepted}");
    assert_eq!(pass2_report.processed, 2);
}

#[test]
fn pass1_skips_skeletons_whose_checksums_are_unchanged_and_already_phase1_complete() {
    let mut done = skeleton("done", 1_000, "already processed", None, vec!["a prior delegation"]);
    done.phase1_complete = true;

    let engine = HierarchyEngine::default();
    let skeletons = vec![done];
    let (_index, report, updates) = run_pass1(&engine, &skeletons, false);

    assert_eq!(report.processed, 1);
    assert!(updates.is_empty(), "a skeleton already phase1_complete needs no new persistence");
}

fn orphan_set() -> Vec<Skeleton> {
    vec![
        skeleton("p1", 1_000, "refactor the billing pipeline", None, vec!["rewrite the invoice formatter"]),
        skeleton("p2", 1_100, "investigate the flaky integration test", None, vec!["add a retry to the test harness"]),
    ]
}

#[rstest::rstest]
#[case("rewrite the invoice formatter", "p1")]
#[case("add a retry to the test harness", "p2")]
fn table_driven_pass2_matches_each_orphan_to_its_declared_delegator(#[case] instruction: &str, #[case] expected_parent: &str) {
    let mut skeletons = orphan_set();
    skeletons.push(skeleton("orphan", 5_000, instruction, None, vec![]));

    let engine = HierarchyEngine::default();
    let (index, _report, _updates) = run_pass1(&engine, &skeletons, false);
    let (pass2_updates, _report) = run_pass2(&engine, &skeletons, &index);

    let resolved = resolve(&pass2_updates, "orphan").expect("orphan should resolve");
    assert_eq!(resolved.as_str(), expected_parent);
}

#[test]
fn is_orphan_matches_pass2s_own_notion_of_orphan() {
    let skeletons = orphan_set();
    let known: HashSet<TaskId> = skeletons.iter().map(|s| s.task_id.clone()).collect();
    for s in &skeletons {
        assert!(s.is_orphan(&known));
    }
}
