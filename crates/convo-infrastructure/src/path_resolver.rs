//! Filesystem `PathResolver` (spec §4.1).

use std::path::PathBuf;

use async_trait::async_trait;
use convo_domain::entities::StorageRoot;
use convo_domain::error::Result;
use convo_domain::ports::PathResolver;
use normpath::PathExt;

/// Resolves storage roots from a fixed, caller-supplied candidate list
/// (`RunnerConfig::storage_roots`), normalizing each candidate to an
/// absolute path and dropping any whose `tasks/` subdirectory is missing.
#[derive(Debug, Clone)]
pub struct FilesystemPathResolver {
    candidates: Vec<PathBuf>,
}

impl FilesystemPathResolver {
    /// Build a resolver over `candidates`, in the order configured. Final
    /// ordering is alphabetical by resolved path, not input order (spec
    /// §4.1: "deterministic across runs").
    #[must_use]
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl PathResolver for FilesystemPathResolver {
    async fn resolve_roots(&self) -> Result<Vec<StorageRoot>> {
        let mut resolved = Vec::with_capacity(self.candidates.len());

        for candidate in &self.candidates {
            let absolute = match candidate.as_path().normalize() {
                Ok(normalized) => normalized.into_path_buf(),
                Err(err) => {
                    tracing::warn!(path = %candidate.display(), error = %err, "skipping unresolvable storage root candidate");
                    continue;
                }
            };

            let tasks_dir = absolute.join(convo_domain::constants::TASKS_DIRNAME);
            if !tasks_dir.is_dir() {
                tracing::warn!(path = %absolute.display(), "dropping storage root: tasks/ subdirectory missing");
                continue;
            }

            resolved.push(absolute);
        }

        resolved.sort();
        resolved.dedup();

        Ok(resolved
            .into_iter()
            .enumerate()
            .map(|(idx, path)| StorageRoot {
                path,
                is_primary: idx == 0,
            })
            .collect())
    }
}
