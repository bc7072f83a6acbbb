//! # Application Layer
//!
//! Pure orchestration over `convo-domain`'s ports: the Skeleton Builder, the
//! two-pass Hierarchy Reconstruction Engine, and the Indexing Decision
//! Service. Nothing in this crate touches a filesystem, a clock source, or a
//! network socket directly — everything goes through a domain port passed
//! in by the caller (`convo-infrastructure`).

#![allow(missing_docs)]

/// Pure policy for whether/how to (re)index a skeleton (spec §4.6).
pub mod indexing_decision;

/// Two-pass hierarchy reconstruction (spec §4.5).
pub mod hierarchy;

/// Compressed prefix tree over normalized instructions (spec §3).
pub mod instruction_index;

/// Builds a `Skeleton` from parsed transcript content (spec §4.3).
pub mod skeleton_builder;

pub use hierarchy::{run_pass1, run_pass2, HierarchyEngine, Pass1Report, Pass1Update, Pass2Report, Pass2Update};
pub use indexing_decision::{
    backoff_secs, decide, migrate_legacy_state, record_failure, record_success, Decision,
    DecisionAction,
};
pub use instruction_index::{InstructionIndex, InstructionMatch, MatchType};
pub use skeleton_builder::{build_skeleton, BuildSkeletonInput};
