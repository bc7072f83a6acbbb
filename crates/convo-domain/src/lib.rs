//! # Domain Layer
//!
//! Core business types for the conversation-state manager: the `Skeleton`
//! summarizing one task, its `IndexingState`, the reconstruction result of
//! hierarchy resolution, and the port traits that infrastructure adapters
//! implement.
//!
//! ## Clean Architecture Principles
//!
//! - **Entities** are at the center with business rules
//! - **Value Objects** are immutable and compared by value
//! - **No infrastructure dependencies** — only standard library, serde, and
//!   the handful of pure-computation crates listed in `Cargo.toml`
//! - **Ports** describe what infrastructure must provide; this crate never
//!   reads a file or talks to a network socket itself

#![allow(missing_docs)]

/// Domain macros (strong-typed identifiers).
#[macro_use]
pub mod macros;

/// Domain-level constants and default operational parameters.
pub mod constants;
/// Core business entities: `Skeleton`, `IndexingState`, reconstruction types.
pub mod entities;
/// Domain error types.
pub mod error;
/// External port interfaces implemented by infrastructure/providers.
pub mod ports;
/// Shared pure-function utilities (text normalization, time, hashing).
pub mod utils;
/// Immutable value objects (`TaskId`, `HostId`).
pub mod value_objects;

pub use entities::{
    IndexingState, IndexingStatus, ReconstructionMethod, ReconstructionResult, Skeleton,
    SourceFileChecksums, StorageRoot, ValidationFailure,
};
pub use error::{Error, Result};
pub use value_objects::{HostId, TaskId};
