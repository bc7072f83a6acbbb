//! A filesystem location holding task directories (spec §3, §4.1).

use std::path::PathBuf;

/// Absolute directory containing a `tasks/` subdirectory. Multiple roots
/// may exist on one host; resolution order is alphabetical by resolved
/// path, and the first entry is the *primary* root that new files (the
/// skeleton cache) are written into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRoot {
    /// Absolute, existing path to the root directory.
    pub path: PathBuf,
    /// Whether this is the primary root (first in resolution order).
    pub is_primary: bool,
}

impl StorageRoot {
    /// Absolute path to this root's `tasks/` directory.
    #[must_use]
    pub fn tasks_dir(&self) -> PathBuf {
        self.path.join(crate::constants::TASKS_DIRNAME)
    }

    /// Absolute path to this root's skeleton-cache directory. Only
    /// meaningful for the primary root (spec §4.4).
    #[must_use]
    pub fn skeleton_cache_dir(&self) -> PathBuf {
        self.tasks_dir().join(crate::constants::SKELETON_CACHE_DIRNAME)
    }
}
