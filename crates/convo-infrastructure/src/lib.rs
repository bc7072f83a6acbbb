//! # Infrastructure Layer
//!
//! Concrete adapters for every port `convo-domain` declares: filesystem
//! storage-root discovery, lenient transcript reading, the on-disk
//! skeleton cache, the background indexing pipeline, plus the ambient
//! runner concerns (configuration, logging bootstrap, host identity) that
//! wire the application layer up to a real process.

#![allow(missing_docs)]

/// Runner-wide configuration (figment + toml + `CONVO_*` env overrides).
pub mod config;
/// Host identity derivation.
pub mod host;
/// Background indexing pipeline: work queue, rate limiting, consistency
/// reconciliation.
pub mod pipeline;
/// Filesystem `PathResolver` implementation.
pub mod path_resolver;
/// Proactive metadata repair: rebuild and write back missing
/// `task_metadata.json` files.
pub mod repair;
/// Explicit cache rebuild: re-run the Skeleton Builder path over the
/// whole task set or a filtered subset and overwrite the cache.
pub mod rebuild;
/// On-disk `SkeletonRepository` implementation.
pub mod skeleton_repository;
/// Structured logging bootstrap.
pub mod telemetry;
/// Filesystem `TranscriptSource` implementation.
pub mod transcript_source;

pub use config::RunnerConfig;
pub use host::resolve_host_id;
pub use path_resolver::FilesystemPathResolver;
pub use pipeline::IndexingPipeline;
pub use rebuild::rebuild_cache;
pub use repair::{repair_missing_metadata, RepairReport};
pub use skeleton_repository::JsonSkeletonRepository;
pub use transcript_source::FilesystemTranscriptSource;
