//! Regex primitives for delegation-instruction and workspace-directory
//! extraction (spec §4.3, §4.5.1, §6). Kept in the domain crate so both the
//! Skeleton Builder and the Hierarchy Engine's Pass 1 (both in
//! `convo-application`) extract instructions identically.

use once_cell::sync::Lazy;
use regex::Regex;

/// One delegation instruction pulled out of a message body, before
/// normalization/truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationMatch {
    /// Delegation mode, when the pattern carried one (e.g. `code`, `debug`).
    pub mode: Option<String>,
    /// The instruction body handed to the sub-task.
    pub message: String,
}

/// `<new_task>`/`<task>` XML-ish envelopes with `<mode>`/`<message>` (or bare
/// body) children (spec §4.5.1 step 1, third bullet).
static NEW_TASK_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)<(?:new_task|task)>\s*(?:<mode>(?P<mode>[^<]*)</mode>\s*)?<message>(?P<message>.*?)</message>\s*</(?:new_task|task)>"#,
    )
    .expect("static regex is valid")
});

/// Structured delegation blocks: an explicit mode name followed by a message
/// body, without full XML wrapping (spec §4.5.1 step 1, first bullet).
/// E.g. `Mode: code\nMessage: implement the retry helper`.
static STRUCTURED_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*mode\s*:\s*(?P<mode>[\w-]+)\s*\n\s*message\s*:\s*(?P<message>.+)$")
        .expect("static regex is valid")
});

/// Inline delegation phrasing: "I delegate/transfer/hand off ... in <mode>
/// mode ..." (spec §4.5.1 step 1, second bullet).
static INLINE_PHRASING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bi(?:'ll| will)?\s+(?:delegate|transfer|hand\s?off)\b(?:[^.\n]*?)\bin\s+(?P<mode>[\w-]+)\s+mode\b[:\s]*(?P<message>.+)",
    )
    .expect("static regex is valid")
});

/// `# Current Workspace Directory (<absolute_path>) Files` inside an
/// environment-details block (spec §4.3, §6).
static WORKSPACE_DIRECTORY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^#\s*Current Workspace Directory\s*\(([^)]+)\)\s*Files\s*$")
        .expect("static regex is valid")
});

/// Runs the union of delegation patterns against one message body, in the
/// order structured block, `<new_task>`/`<task>` tag, inline phrasing —
/// first pattern that matches wins for a given message.
#[must_use]
pub fn extract_delegations(text: &str) -> Vec<DelegationMatch> {
    let mut out = Vec::new();

    for caps in STRUCTURED_BLOCK_RE.captures_iter(text) {
        out.push(DelegationMatch {
            mode: caps.name("mode").map(|m| m.as_str().trim().to_owned()),
            message: caps["message"].trim().to_owned(),
        });
    }
    for caps in NEW_TASK_TAG_RE.captures_iter(text) {
        out.push(DelegationMatch {
            mode: caps
                .name("mode")
                .map(|m| m.as_str().trim().to_owned())
                .filter(|m| !m.is_empty()),
            message: caps["message"].trim().to_owned(),
        });
    }
    for caps in INLINE_PHRASING_RE.captures_iter(text) {
        out.push(DelegationMatch {
            mode: caps.name("mode").map(|m| m.as_str().trim().to_owned()),
            message: caps["message"].trim().to_owned(),
        });
    }

    out.retain(|d| !d.message.is_empty());
    out
}

/// Extracts the workspace directory from an environment-details block, when
/// present (spec §4.3 lower-confidence fallback).
#[must_use]
pub fn extract_workspace_directory(text: &str) -> Option<String> {
    WORKSPACE_DIRECTORY_RE
        .captures(text)
        .map(|caps| caps[1].trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case::structured_block(
        "Mode: code\nMessage: implement the retry helper with backoff",
        Some("code"),
        "implement the retry helper with backoff"
    )]
    #[case::new_task_tag(
        "<new_task><mode>debug</mode><message>find why the queue stalls</message></new_task>",
        Some("debug"),
        "find why the queue stalls"
    )]
    #[case::inline_phrasing(
        "I'll delegate this to you in code mode: write a unit test for the parser",
        Some("code"),
        "write a unit test for the parser"
    )]
    fn extracts_one_delegation_per_pattern_variant(
        #[case] text: &str,
        #[case] expected_mode: Option<&str>,
        #[case] expected_message: &str,
    ) {
        let found = extract_delegations(text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].mode.as_deref(), expected_mode);
        assert_eq!(found[0].message, expected_message);
    }

    #[test]
    fn extracts_workspace_directory_from_environment_details() {
        let text = "some preamble\n# Current Workspace Directory (/home/dev/project) Files\nsrc/main.rs\n";
        assert_eq!(
            extract_workspace_directory(text),
            Some("/home/dev/project".to_owned())
        );
    }

    #[test]
    fn no_match_returns_empty() {
        assert!(extract_delegations("just a normal chat message").is_empty());
        assert!(extract_workspace_directory("no such block here").is_none());
    }
}
