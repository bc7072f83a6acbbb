//! Two-pass Hierarchy Reconstruction Engine (spec §4.5).
//!
//! Both passes are pure: they take an in-memory slice of `Skeleton`s and
//! return the updates the caller should persist, plus a report of counts
//! for observability. Neither pass reads a file or calls the clock itself
//! (`now_ms` for temporal checks is supplied by the caller).

mod pass1;
mod pass2;
mod validator;

pub use pass1::{run_pass1, Pass1Report, Pass1Update};
pub use pass2::{run_pass2, Pass2Report, Pass2Update};

use convo_domain::constants::{
    DEFAULT_FUZZY_THRESHOLD, DEFAULT_MIN_CONFIDENCE, DEFAULT_RECONSTRUCTION_BATCH_SIZE,
    DEFAULT_TEMPORAL_PROXIMITY_WINDOW_MS,
};

/// Tunable thresholds the engine applies across both passes (spec §6
/// "Operational parameters").
#[derive(Debug, Clone, Copy)]
pub struct HierarchyEngine {
    /// Minimum confidence to accept a Pass 2 resolution.
    pub min_confidence: f64,
    /// Minimum symmetric similarity for a fuzzy index match.
    pub fuzzy_threshold: f64,
    /// Temporal-proximity fallback window, in milliseconds.
    pub temporal_window_ms: i64,
    /// Logical batch size for reporting/progress purposes; both passes
    /// still process the full input slice, batching is observational only
    /// since nothing here suspends.
    pub batch_size: usize,
}

impl Default for HierarchyEngine {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            temporal_window_ms: DEFAULT_TEMPORAL_PROXIMITY_WINDOW_MS,
            batch_size: DEFAULT_RECONSTRUCTION_BATCH_SIZE,
        }
    }
}
