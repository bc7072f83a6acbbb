//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the conversation-state manager core
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON parsing or serialization error
    #[error("JSON parsing error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// A transcript file could not be parsed as valid JSON, but the caller
    /// should skip the task rather than abort the batch.
    #[error("malformed transcript at {path}: {detail}")]
    Malformed {
        /// Path of the file that failed to parse
        path: String,
        /// Human-readable detail, including offset/snippet where available
        detail: String,
    },

    /// Resource not found error
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// Invalid argument provided to a function
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument
        message: String,
    },

    /// The OS refused a read or write. Treated as permanent for indexing
    /// purposes (spec §7).
    #[error("permission denied: {path}")]
    Permission {
        /// Path that could not be accessed
        path: String,
    },

    /// Configuration-related error
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// Remote vector-store operation failed transiently (network, timeout,
    /// rate-limit, service-unavailable). Retryable with backoff.
    #[error("transient remote error: {message}")]
    TransientRemote {
        /// Description of the transient failure
        message: String,
    },

    /// Remote vector-store operation failed permanently (authentication,
    /// permanent quota, invalid format).
    #[error("permanent remote error: {message}")]
    PermanentRemote {
        /// Description of the permanent failure
        message: String,
    },

    /// A reconstructed-parent candidate failed existence/temporal/cycle/
    /// workspace validation. Never surfaced to a user; the orphan simply
    /// stays unresolved.
    #[error("validation failed: {reason}")]
    Validation {
        /// Which check failed
        reason: ValidationFailureReason,
    },

    /// Local/remote indexed-count discrepancy exceeded the configured
    /// threshold during a consistency reconciliation pass.
    #[error("consistency warning: local={local} remote={remote} threshold={threshold}")]
    ConsistencyWarning {
        /// Locally recorded indexed count
        local: u64,
        /// Remote host-point count
        remote: u64,
        /// Discrepancy threshold that was exceeded
        threshold: u64,
    },

    /// Internal invariant violation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

/// Why a candidate parent was rejected by the Parent Validator (spec §4.5.2 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailureReason {
    /// Candidate parent id does not exist in the skeleton set
    NotFound,
    /// Candidate was created after the orphan (temporal check)
    Temporal,
    /// Accepting the candidate would create a cycle
    Cycle,
    /// Candidate and orphan have differing, both-defined workspaces
    Workspace,
}

impl std::fmt::Display for ValidationFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotFound => "not-found",
            Self::Temporal => "temporal",
            Self::Cycle => "cycle",
            Self::Workspace => "workspace",
        };
        f.write_str(s)
    }
}

impl Error {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an I/O error with a message and no further source
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a malformed-transcript error
    pub fn malformed<S: Into<String>, D: Into<String>>(path: S, detail: D) -> Self {
        Self::Malformed {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failure_reason_displays_kebab_case() {
        assert_eq!(ValidationFailureReason::NotFound.to_string(), "not-found");
        assert_eq!(ValidationFailureReason::Cycle.to_string(), "cycle");
    }

    #[test]
    fn malformed_error_carries_path_and_detail() {
        let err = Error::malformed("/root/tasks/1/ui_messages.json", "unexpected EOF at byte 12");
        match err {
            Error::Malformed { path, detail } => {
                assert_eq!(path, "/root/tasks/1/ui_messages.json");
                assert!(detail.contains("byte 12"));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }
}
