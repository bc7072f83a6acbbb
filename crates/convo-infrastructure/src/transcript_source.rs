//! Filesystem `TranscriptSource` (spec §4.2): BOM-stripping, lenient JSON
//! parsing, and structured malformed results.

use std::path::Path;

use async_trait::async_trait;
use convo_domain::error::Result;
use convo_domain::ports::{ParsedFile, TranscriptSource};

const SNIPPET_RADIUS: usize = 40;

/// Reads the three per-task transcript files straight off disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemTranscriptSource;

impl FilesystemTranscriptSource {
    /// Construct a new reader. Stateless; all inputs are per-call paths.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn read_one(&self, path: &Path) -> Result<ParsedFile> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ParsedFile::Missing);
            }
            Err(err) => return Err(err.into()),
        };

        let stripped = strip_bom(&bytes);
        let text = String::from_utf8_lossy(stripped);

        match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => Ok(ParsedFile::Value(value)),
            Err(err) => Ok(ParsedFile::Malformed {
                path: path.display().to_string(),
                offset: Some(err.column()),
                snippet: snippet_around(&text, err.line(), err.column()),
            }),
        }
    }
}

#[async_trait]
impl TranscriptSource for FilesystemTranscriptSource {
    async fn read_task_metadata(&self, task_dir: &Path) -> Result<ParsedFile> {
        self.read_one(&task_dir.join(convo_domain::constants::TASK_METADATA_FILENAME))
            .await
    }

    async fn read_api_history(&self, task_dir: &Path) -> Result<ParsedFile> {
        self.read_one(&task_dir.join(convo_domain::constants::API_HISTORY_FILENAME))
            .await
    }

    async fn read_ui_messages(&self, task_dir: &Path) -> Result<ParsedFile> {
        self.read_one(&task_dir.join(convo_domain::constants::UI_MESSAGES_FILENAME))
            .await
    }

    async fn write_task_metadata(&self, task_dir: &Path, value: &serde_json::Value) -> Result<()> {
        let path = task_dir.join(convo_domain::constants::TASK_METADATA_FILENAME);
        let serialized = serde_json::to_vec_pretty(value)?;
        write_atomic(&path, &serialized).await
    }
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes)
}

/// A short window of the offending line, for the `Malformed` diagnostic.
fn snippet_around(text: &str, line: usize, column: usize) -> String {
    let Some(offending_line) = text.lines().nth(line.saturating_sub(1)) else {
        return String::new();
    };
    let start = column.saturating_sub(SNIPPET_RADIUS);
    let end = (column + SNIPPET_RADIUS).min(offending_line.len());
    offending_line.get(start..end).unwrap_or(offending_line).to_owned()
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Err(convo_domain::error::Error::invalid_argument(
            "write target has no parent directory",
        ));
    };
    tokio::fs::create_dir_all(parent).await?;

    let tmp_path = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("repair"),
        uuid::Uuid::new_v4()
    ));
    tokio::fs::write(&tmp_path, bytes).await?;
    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_file_reports_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let source = FilesystemTranscriptSource::new();
        let result = source.read_task_metadata(tmp.path()).await.unwrap();
        assert!(matches!(result, ParsedFile::Missing));
    }

    #[tokio::test]
    async fn strips_bom_before_parsing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(convo_domain::constants::TASK_METADATA_FILENAME);
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(br#"{"title":"hello"}"#);
        tokio::fs::write(&path, bytes).await.unwrap();

        let source = FilesystemTranscriptSource::new();
        let result = source.read_task_metadata(tmp.path()).await.unwrap();
        let value = result.value().expect("should parse");
        assert_eq!(value["title"], "hello");
    }

    #[tokio::test]
    async fn malformed_json_reports_path_and_snippet() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(convo_domain::constants::UI_MESSAGES_FILENAME);
        tokio::fs::write(&path, b"{not valid json").await.unwrap();

        let source = FilesystemTranscriptSource::new();
        let result = source.read_ui_messages(tmp.path()).await.unwrap();
        match result {
            ParsedFile::Malformed { path: reported, .. } => {
                assert!(reported.ends_with("ui_messages.json"));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn write_task_metadata_is_atomic_and_readable_back() {
        let tmp = tempfile::tempdir().unwrap();
        let source = FilesystemTranscriptSource::new();
        source
            .write_task_metadata(tmp.path(), &json!({"title": "repaired"}))
            .await
            .unwrap();

        let result = source.read_task_metadata(tmp.path()).await.unwrap();
        assert_eq!(result.value().unwrap()["title"], "repaired");

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
