//! Strong-typed identifiers used across the conversation-state manager.

use crate::define_id;

define_id!(
    TaskId,
    "Opaque identifier minted by the host tool when a task directory is created. \
     Unique within the set of all tasks seen by the system; never reassigned."
);

define_id!(
    HostId,
    "Stable identifier of the host running this instance, used as a tag in the \
     remote vector store so each host's points can be counted independently."
);

impl HostId {
    /// Derive a `HostId` from the local hostname, stable across restarts on
    /// the same machine. The hostname itself is hashed rather than stored
    /// verbatim so the id can be used as an opaque tag.
    #[must_use]
    pub fn from_hostname(hostname: &str) -> Self {
        let normalized = hostname.trim().to_lowercase();
        Self::new(crate::utils::id::compute_content_hash(&normalized))
    }
}
