//! Immutable value objects.

mod ids;

pub use ids::{HostId, TaskId};
