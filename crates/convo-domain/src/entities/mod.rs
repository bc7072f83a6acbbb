//! Core business entities.

mod indexing_state;
mod reconstruction;
mod skeleton;
mod storage_root;

pub use indexing_state::{IndexingState, IndexingStatus, RemoteErrorKind};
pub use reconstruction::{
    ReconstructionMethod, ReconstructionResult, ValidationFailure, ValidationOutcome,
};
pub use skeleton::{Skeleton, SkeletonCounts, SourceFileChecksums};
pub use storage_root::StorageRoot;
