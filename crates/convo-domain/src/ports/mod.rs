//! External Provider Ports
//!
//! Traits that `convo-infrastructure` and `convo-providers` implement and
//! that `convo-application` depends on. Keeping them here, rather than on
//! the concrete adapters, is what lets the application layer be tested
//! against in-memory fakes with zero I/O.

mod clock;
mod path_resolver;
mod skeleton_repository;
mod transcript;
mod vector_store;

pub use clock::{Clock, SystemClock};
pub use path_resolver::PathResolver;
pub use skeleton_repository::SkeletonRepository;
pub use transcript::{ParsedFile, TranscriptSource};
pub use vector_store::{IndexableContent, VectorStoreProvider};
