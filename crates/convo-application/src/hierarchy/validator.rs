//! Parent Validator (spec §4.5.2 step 5): existence, temporal, cycle, and
//! workspace checks run against a chosen Pass 2 candidate before it is
//! accepted.

use std::collections::{HashMap, HashSet};

use convo_domain::entities::ValidationOutcome;
use convo_domain::error::ValidationFailureReason;
use convo_domain::value_objects::TaskId;
use convo_domain::Skeleton;

/// Validates `candidate` as a parent for `orphan` against the full known
/// skeleton set. Checks run in the order the spec lists them; the first
/// failure is reported — a rejected candidate is never replaced by a
/// lower-scored one (the caller simply leaves the orphan unresolved).
#[must_use]
pub fn validate_candidate(
    candidate_id: &TaskId,
    orphan: &Skeleton,
    by_id: &HashMap<TaskId, &Skeleton>,
) -> ValidationOutcome {
    let Some(candidate) = by_id.get(candidate_id) else {
        return ValidationOutcome::Invalid(ValidationFailureReason::NotFound);
    };

    if candidate.created_at > orphan.created_at {
        return ValidationOutcome::Invalid(ValidationFailureReason::Temporal);
    }

    if would_create_cycle(candidate_id, &orphan.task_id, by_id) {
        return ValidationOutcome::Invalid(ValidationFailureReason::Cycle);
    }

    if let (Some(a), Some(b)) = (&candidate.workspace, &orphan.workspace) {
        if a != b {
            return ValidationOutcome::Invalid(ValidationFailureReason::Workspace);
        }
    }

    ValidationOutcome::Valid
}

/// Walks the parent chain upward from `candidate_id` (via
/// `effective_parent_id`, i.e. declared-or-reconstructed), stopping the
/// instant `orphan_id` is encountered (cycle) or a node repeats (a
/// pre-existing cycle elsewhere in the graph, not introduced by this
/// acceptance — safe to stop without flagging). The explicit visited set
/// guarantees termination regardless of how the rest of the graph looks
/// (spec §9: "make the set and termination condition explicit").
fn would_create_cycle(
    candidate_id: &TaskId,
    orphan_id: &TaskId,
    by_id: &HashMap<TaskId, &Skeleton>,
) -> bool {
    let mut current = Some(candidate_id.clone());
    let mut visited: HashSet<TaskId> = HashSet::new();

    while let Some(id) = current {
        if &id == orphan_id {
            return true;
        }
        if !visited.insert(id.clone()) {
            return false;
        }
        current = by_id
            .get(&id)
            .and_then(|s| s.effective_parent_id().cloned());
    }
    false
}
