//! Outputs of the Hierarchy Reconstruction Engine (spec §4.5, §3).

use serde::{Deserialize, Serialize};

use crate::error::ValidationFailureReason;
use crate::value_objects::TaskId;

/// How a parent was assigned to an orphan skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconstructionMethod {
    /// Normalized prefix equals an `InstructionIndex` key exactly.
    Exact,
    /// One of the two normalized instructions is a prefix of the other.
    Prefix,
    /// Significant-word Jaccard similarity above the fuzzy threshold.
    Fuzzy,
    /// Nearest predecessor in the same workspace within the temporal window.
    TemporalProximity,
    /// A same-workspace skeleton's `child_task_instruction_prefixes`
    /// contained a matching prefix.
    Metadata,
    /// The instruction looked like an opening/greeting message, or was too
    /// short to match against — treated as a hierarchy root.
    RootDetected,
}

/// Why a reconstruction attempt did not produce an accepted parent link.
pub use ValidationFailureReason as ValidationFailure;

/// Outcome of validating a candidate parent (spec §4.5.2 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// The candidate passed existence/temporal/cycle/workspace checks.
    Valid,
    /// The candidate was rejected; see the contained reason.
    Invalid(ValidationFailure),
}

/// Per-skeleton result of Pass 2 (spec §3).
#[derive(Debug, Clone)]
pub struct ReconstructionResult {
    /// Resolved parent, if any candidate was accepted.
    pub resolved_parent_id: Option<TaskId>,
    /// Confidence score in `[0, 1]`.
    pub confidence_score: f64,
    /// Method that produced `resolved_parent_id`.
    pub method: ReconstructionMethod,
    /// Whether the candidate passed validation.
    pub validation: ValidationOutcome,
}

impl ReconstructionResult {
    /// Build the result for a skeleton detected as a hierarchy root (spec
    /// §4.5.2 step 1): no parent, full confidence, always valid.
    #[must_use]
    pub fn root() -> Self {
        Self {
            resolved_parent_id: None,
            confidence_score: crate::constants::ROOT_DETECTED_CONFIDENCE,
            method: ReconstructionMethod::RootDetected,
            validation: ValidationOutcome::Valid,
        }
    }
}
