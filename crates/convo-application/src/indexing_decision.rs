//! Pure policy: should a skeleton be (re)indexed right now, and what
//! happens to its `IndexingState` after an attempt completes (spec §4.6).
//!
//! Nothing here touches a clock or a file; `now_ms` and `current_content_hash`
//! are supplied by the caller (`convo-infrastructure`'s pipeline and cache
//! load path) so every rule is deterministic and unit-testable without
//! sleeping real time.

use convo_domain::constants::{RETRY_BACKOFF_BASE_SECS, RETRY_BACKOFF_MAX_SECS};
use convo_domain::entities::{IndexingState, IndexingStatus, RemoteErrorKind};

/// What the caller should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
    /// Submit fresh content to the remote store.
    Fresh,
    /// Backoff has elapsed; retry the submission.
    Retry,
    /// Do nothing this round.
    Skip,
}

/// Output of [`decide`].
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Whether the caller should call the vector store's `index` operation.
    pub should_index: bool,
    /// The action this decision represents.
    pub action: DecisionAction,
    /// Human-readable justification, useful in logs.
    pub reason: &'static str,
    /// Whether the caller must persist the skeleton even though no indexing
    /// call was made (true only for the legacy-migration path, see
    /// [`migrate_legacy_state`]).
    pub requires_save: bool,
}

impl Decision {
    fn skip(reason: &'static str) -> Self {
        Self {
            should_index: false,
            action: DecisionAction::Skip,
            reason,
            requires_save: false,
        }
    }

    fn fresh(reason: &'static str) -> Self {
        Self {
            should_index: true,
            action: DecisionAction::Fresh,
            reason,
            requires_save: false,
        }
    }

    fn retry(reason: &'static str) -> Self {
        Self {
            should_index: true,
            action: DecisionAction::Retry,
            reason,
            requires_save: false,
        }
    }
}

/// Decides whether `state` should be (re)indexed, per the state table in
/// spec §4.6. `current_content_hash` is the hash of the indexable content
/// as it exists right now; comparing it against `state.content_hash`
/// detects content drift since the last successful index.
#[must_use]
pub fn decide(state: &IndexingState, now_ms: i64, current_content_hash: &str) -> Decision {
    match state.status {
        IndexingStatus::Pending => Decision::fresh("never attempted"),

        IndexingStatus::Indexed => {
            if state.content_hash.as_deref() == Some(current_content_hash) {
                Decision::skip("already current")
            } else {
                Decision::fresh("content changed since last index")
            }
        }

        IndexingStatus::Retry => match state.next_retry_not_before {
            Some(not_before) if now_ms >= not_before => Decision::retry("backoff elapsed"),
            _ => Decision::skip("backoff not elapsed"),
        },

        IndexingStatus::Failed => Decision::skip("permanently failed"),

        IndexingStatus::Skipped => Decision::skip("previously skipped"),
    }
}

/// Handles the legacy-field migration row of the decision table: a skeleton
/// read from disk carried a bare `qdrantIndexedAt` timestamp instead of a
/// populated `IndexingState`. The cache-load path (in
/// `convo-infrastructure`) detects this shape before deserializing into a
/// `Skeleton` and calls this function to build both the migrated state and
/// the decision that goes with it, so the caller can persist the migrated
/// form in the same pass it would otherwise have skipped (spec §3 "Legacy
/// migration", §4.6 second row).
#[must_use]
pub fn migrate_legacy_state(
    legacy_indexed_at_ms: i64,
    current_content_hash: &str,
) -> (IndexingState, Decision) {
    let state = IndexingState::indexed(legacy_indexed_at_ms, current_content_hash.to_owned());
    let decision = Decision {
        should_index: false,
        action: DecisionAction::Skip,
        reason: "migrated legacy indexed-at timestamp",
        requires_save: true,
    };
    (state, decision)
}

/// Builds the state transition after a successful indexing call (spec
/// §4.6 "On success").
#[must_use]
pub fn record_success(now_ms: i64, content_hash: String) -> IndexingState {
    IndexingState::indexed(now_ms, content_hash)
}

/// Builds the state transition after a failed indexing call (spec §4.6 "On
/// failure"): permanent errors move straight to `Failed`; transient errors
/// move to `Retry` with an exponential backoff capped at
/// `RETRY_BACKOFF_MAX_SECS`.
#[must_use]
pub fn record_failure(
    previous: &IndexingState,
    now_ms: i64,
    error_kind: RemoteErrorKind,
    error_message: String,
) -> IndexingState {
    let attempt_count = previous.attempt_count + 1;
    let status = if error_kind.is_permanent() {
        IndexingStatus::Failed
    } else {
        IndexingStatus::Retry
    };
    let next_retry_not_before = (!error_kind.is_permanent())
        .then(|| now_ms + i64::try_from(backoff_secs(attempt_count) * 1000).unwrap_or(i64::MAX));

    IndexingState {
        status,
        last_attempt_at: Some(now_ms),
        attempt_count,
        last_error_kind: Some(error_kind),
        last_error_message: Some(error_message),
        next_retry_not_before,
        indexed_at: previous.indexed_at,
        content_hash: previous.content_hash.clone(),
    }
}

/// Exponential backoff, in seconds, for the `attempt_count`-th consecutive
/// transient failure: `base * 2^(attempt_count - 1)`, capped.
#[must_use]
pub fn backoff_secs(attempt_count: u32) -> u64 {
    let shift = attempt_count.saturating_sub(1).min(63);
    RETRY_BACKOFF_BASE_SECS
        .saturating_mul(1u64.checked_shl(shift).unwrap_or(u64::MAX))
        .min(RETRY_BACKOFF_MAX_SECS)
}
