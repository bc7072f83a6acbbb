//! Transcript Reader port (spec §4.2).

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Outcome of reading and lenient-parsing one transcript file.
///
/// A parse failure never propagates as an `Err` from the reader itself —
/// callers (Skeleton Builder, Hierarchy Engine passes) receive `Malformed`
/// and decide whether to skip the task, per spec §4.2/§7.
#[derive(Debug, Clone)]
pub enum ParsedFile {
    /// The file does not exist.
    Missing,
    /// The file exists but is not valid JSON once the BOM is stripped.
    Malformed {
        /// Absolute path of the file.
        path: String,
        /// Byte offset of the parse failure, when known.
        offset: Option<usize>,
        /// Short snippet of the surrounding content.
        snippet: String,
    },
    /// Successfully parsed JSON content.
    Value(serde_json::Value),
}

impl ParsedFile {
    /// The parsed value, or `None` if missing/malformed.
    #[must_use]
    pub fn value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Reads the three per-task transcript files, tolerating a missing BOM,
/// lenient JSON, and partial/corrupt files (spec §4.2).
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Reads `task_metadata.json` from `task_dir`.
    async fn read_task_metadata(&self, task_dir: &Path) -> Result<ParsedFile>;

    /// Reads `api_conversation_history.json` from `task_dir`.
    async fn read_api_history(&self, task_dir: &Path) -> Result<ParsedFile>;

    /// Reads `ui_messages.json` from `task_dir`.
    async fn read_ui_messages(&self, task_dir: &Path) -> Result<ParsedFile>;

    /// Writes a rebuilt `task_metadata.json` back to `task_dir` (Proactive
    /// Metadata Repair, spec §4.4).
    async fn write_task_metadata(&self, task_dir: &Path, value: &serde_json::Value) -> Result<()>;
}
