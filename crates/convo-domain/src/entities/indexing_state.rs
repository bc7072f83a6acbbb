//! Per-task indexing state, tracked as part of a [`super::Skeleton`] and
//! driven by the Indexing Decision Service (spec §4.6).

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Status of a task's semantic-index submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingStatus {
    /// Never attempted.
    Pending,
    /// Successfully indexed; `indexed_at` and `content_hash` are set.
    Indexed,
    /// A transient failure occurred; eligible for another attempt once
    /// `next_retry_not_before` has passed.
    Retry,
    /// A permanent failure occurred; will not be retried automatically.
    Failed,
    /// Decision Service chose not to (re)index (already current, or
    /// backoff has not elapsed).
    Skipped,
}

/// Classification of a remote indexing failure, used to decide whether the
/// Decision Service transitions a skeleton to `Retry` or `Failed` (spec
/// §4.6, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteErrorKind {
    /// Authentication failure against the remote store.
    Authentication,
    /// Quota permanently exceeded (not a transient rate limit).
    QuotaPermanentlyExceeded,
    /// The indexable content or its source file could not be found.
    FileNotFound,
    /// The remote store denied access to the resource.
    AccessDenied,
    /// The remote store rejected the request format.
    InvalidFormat,
    /// The content was corrupted and cannot be embedded.
    Corrupted,
    /// Network-level failure (connection refused, DNS, etc.).
    Network,
    /// The remote call exceeded its timeout.
    Timeout,
    /// The remote store is rate-limiting this client.
    RateLimit,
    /// The remote store reported itself unavailable.
    ServiceUnavailable,
}

impl RemoteErrorKind {
    /// Whether this error kind is permanent (spec §7: authentication,
    /// permanent quota, not-found, access-denied, invalid-format,
    /// corrupted) as opposed to transient (network, timeout, rate-limit,
    /// service-unavailable).
    #[must_use]
    pub fn is_permanent(self) -> bool {
        matches!(
            self,
            Self::Authentication
                | Self::QuotaPermanentlyExceeded
                | Self::FileNotFound
                | Self::AccessDenied
                | Self::InvalidFormat
                | Self::Corrupted
        )
    }
}

/// Indexing state attached to a [`super::Skeleton`].
///
/// Invariants (spec §3): `status == Indexed` implies `indexed_at` and
/// `content_hash` are both `Some`; `status == Failed` implies
/// `last_error_kind` is a permanent kind; `status == Retry` implies
/// `next_retry_not_before > last_attempt_at`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingState {
    /// Current status.
    pub status: IndexingStatus,
    /// Unix millis of the most recent attempt, if any.
    pub last_attempt_at: Option<i64>,
    /// Number of attempts made so far. Reset to 0 on success.
    pub attempt_count: u32,
    /// Classification of the most recent failure, if any.
    pub last_error_kind: Option<RemoteErrorKind>,
    /// Human-readable message for the most recent failure.
    pub last_error_message: Option<String>,
    /// Earliest Unix millis at which a retry is permitted.
    pub next_retry_not_before: Option<i64>,
    /// Unix millis at which the task was last successfully indexed.
    pub indexed_at: Option<i64>,
    /// Hash of the indexable content as of the last successful index.
    pub content_hash: Option<String>,
}

impl Default for IndexingState {
    fn default() -> Self {
        Self {
            status: IndexingStatus::Pending,
            last_attempt_at: None,
            attempt_count: 0,
            last_error_kind: None,
            last_error_message: None,
            next_retry_not_before: None,
            indexed_at: None,
            content_hash: None,
        }
    }
}

impl IndexingState {
    /// Build the `Indexed` state for a successful attempt.
    #[must_use]
    pub fn indexed(now_ms: i64, content_hash: String) -> Self {
        Self {
            status: IndexingStatus::Indexed,
            last_attempt_at: Some(now_ms),
            attempt_count: 0,
            last_error_kind: None,
            last_error_message: None,
            next_retry_not_before: None,
            indexed_at: Some(now_ms),
            content_hash: Some(content_hash),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_kinds_match_spec_list() {
        assert!(RemoteErrorKind::Authentication.is_permanent());
        assert!(RemoteErrorKind::QuotaPermanentlyExceeded.is_permanent());
        assert!(RemoteErrorKind::FileNotFound.is_permanent());
        assert!(RemoteErrorKind::AccessDenied.is_permanent());
        assert!(RemoteErrorKind::InvalidFormat.is_permanent());
        assert!(RemoteErrorKind::Corrupted.is_permanent());
    }

    #[test]
    fn transient_kinds_are_not_permanent() {
        assert!(!RemoteErrorKind::Network.is_permanent());
        assert!(!RemoteErrorKind::Timeout.is_permanent());
        assert!(!RemoteErrorKind::RateLimit.is_permanent());
        assert!(!RemoteErrorKind::ServiceUnavailable.is_permanent());
    }

    #[test]
    fn default_state_is_pending_with_no_attempts() {
        let state = IndexingState::default();
        assert_eq!(state.status, IndexingStatus::Pending);
        assert_eq!(state.attempt_count, 0);
        assert!(state.indexed_at.is_none());
    }
}
