//! Produces a compact `Skeleton` from a task's three parsed transcript
//! files (spec §4.3).

use convo_domain::entities::{Skeleton, SkeletonCounts, SourceFileChecksums};
use convo_domain::ports::ParsedFile;
use convo_domain::utils::{patterns, text};
use convo_domain::value_objects::TaskId;
use convo_domain::IndexingState;

/// Inputs available to the builder for one task. Everything here has
/// already been read and leniently parsed by a `TranscriptSource`; the
/// builder itself does no I/O.
#[derive(Debug, Clone)]
pub struct BuildSkeletonInput<'a> {
    /// Identity of the task directory this skeleton summarizes.
    pub task_id: TaskId,
    /// Absolute path of the task directory (stored as `data_source`).
    pub data_source: String,
    /// Parsed `task_metadata.json`.
    pub metadata: &'a ParsedFile,
    /// Parsed `api_conversation_history.json`.
    pub api_history: &'a ParsedFile,
    /// Parsed `ui_messages.json`.
    pub ui_messages: &'a ParsedFile,
    /// Checksums of the three source files as read this pass.
    pub source_file_checksums: SourceFileChecksums,
    /// Fallback creation timestamp (Unix millis) when metadata carries
    /// none — typically the task directory's filesystem mtime.
    pub fallback_created_at: i64,
}

/// Builds a fresh `Skeleton`, preserving no prior indexing/reconstruction
/// state — callers merge this with any existing cached skeleton as needed
/// (spec §4.4: "rewritten on disk when any field changes").
#[must_use]
pub fn build_skeleton(input: BuildSkeletonInput<'_>) -> Skeleton {
    let metadata_value = input.metadata.value();

    let declared_parent = metadata_value
        .and_then(|v| v.get("parent_task_id"))
        .and_then(|v| v.as_str())
        .map(TaskId::new);

    let title = metadata_value
        .and_then(|v| v.get("title"))
        .and_then(|v| v.as_str())
        .map(ToOwned::to_owned);

    let created_at = metadata_value
        .and_then(|v| v.get("created_at"))
        .and_then(serde_json::Value::as_i64)
        .unwrap_or(input.fallback_created_at);

    let mut workspace = metadata_value
        .and_then(|v| v.get("workspace"))
        .and_then(|v| v.as_str())
        .map(ToOwned::to_owned);

    let ui_messages = input.ui_messages.value().and_then(|v| v.as_array());

    if workspace.is_none() {
        if let Some(messages) = ui_messages {
            workspace = messages
                .iter()
                .filter_map(message_text)
                .find_map(|text| patterns::extract_workspace_directory(&text));
        }
    }

    let first_user_message = ui_messages
        .and_then(|messages| messages.iter().find(|m| is_role(m, "user")))
        .and_then(message_text)
        .unwrap_or_default();
    let truncated_instruction =
        text::normalize_and_truncate(&first_user_message, convo_domain::constants::INSTRUCTION_STORAGE_CHARS);

    let child_task_instruction_prefixes = ui_messages
        .map(|messages| extract_child_instruction_prefixes(messages))
        .unwrap_or_default();

    let api_messages = input.api_history.value().and_then(|v| v.as_array());
    let message_count = ui_messages.map_or(0, Vec::len) as u64 + api_messages.map_or(0, Vec::len) as u64;
    let action_count = ui_messages.map_or(0, |messages| {
        messages.iter().filter(|m| is_action(m)).count()
    }) as u64;
    let byte_count = [input.metadata, input.api_history, input.ui_messages]
        .iter()
        .filter_map(|p| p.value())
        .map(|v| serde_json::to_string(v).map(|s| s.len()).unwrap_or(0) as u64)
        .sum();

    let last_activity = ui_messages
        .and_then(|messages| messages.iter().filter_map(message_timestamp).max())
        .or_else(|| api_messages.and_then(|messages| messages.iter().filter_map(message_timestamp).max()))
        .unwrap_or(created_at);

    Skeleton {
        task_id: input.task_id,
        parent_task_id: declared_parent,
        truncated_instruction,
        workspace,
        created_at,
        last_activity,
        counts: SkeletonCounts {
            messages: message_count,
            actions: action_count,
            bytes: byte_count,
        },
        title,
        child_task_instruction_prefixes,
        indexing_state: IndexingState::default(),
        data_source: input.data_source,
        source_file_checksums: input.source_file_checksums,
        phase1_complete: false,
        reconstructed_parent_id: None,
        parent_confidence_score: None,
        parent_resolution_method: None,
    }
}

/// Extracts every delegation instruction from a task's UI messages,
/// normalized/truncated and deduplicated by normalized form, preserving
/// emission order (spec §4.3, §4.5.1 step 2).
#[must_use]
pub fn extract_child_instruction_prefixes(ui_messages: &[serde_json::Value]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for message in ui_messages {
        let Some(body) = message_text(message) else {
            continue;
        };
        for delegation in patterns::extract_delegations(&body) {
            let normalized = text::normalize_and_truncate(
                &delegation.message,
                convo_domain::constants::INSTRUCTION_STORAGE_CHARS,
            );
            if seen.insert(normalized.clone()) {
                out.push(normalized);
            }
        }
    }
    out
}

fn is_role(message: &serde_json::Value, role: &str) -> bool {
    message.get("role").and_then(|r| r.as_str()) == Some(role)
}

fn is_action(message: &serde_json::Value) -> bool {
    matches!(
        message.get("type").and_then(|t| t.as_str()),
        Some("tool_use") | Some("tool_call") | Some("action")
    )
}

fn message_timestamp(message: &serde_json::Value) -> Option<i64> {
    message
        .get("ts")
        .or_else(|| message.get("timestamp"))
        .and_then(serde_json::Value::as_i64)
}

/// Extracts the plain-text body of a message, whether `content` is a bare
/// string or an array of `{type, text}` blocks (both shapes are common
/// across assistant-message transcript formats).
fn message_text(message: &serde_json::Value) -> Option<String> {
    match message.get("content")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(parts) => {
            let joined: String = parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join("\n");
            if joined.is_empty() {
                None
            } else {
                Some(joined)
            }
        }
        _ => None,
    }
}
