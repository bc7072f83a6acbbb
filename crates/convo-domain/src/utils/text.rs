//! Instruction-text normalization shared by the Skeleton Builder, the
//! Instruction Index, and the Hierarchy Engine's matchers.

/// A handful of very common opening words. Not a full stop-word list —
/// just enough to keep significant-word overlap from being dominated by
/// "the", "a", "to", etc. (spec §4.5.2 step 2/3).
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "to", "of", "and", "or", "in", "on", "for", "with", "is", "are", "this",
    "that", "please", "i", "you", "me", "it", "be", "at", "as", "by", "from",
];

/// Patterns recognized as empty/greeting/opening instructions (spec §4.5.2
/// step 1). Matched against the normalized, lowercased instruction.
const GREETING_PREFIXES: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "please",
    "i would like",
    "i'd like",
    "can you",
    "could you",
    "thanks",
    "thank you",
];

/// Lowercases, collapses consecutive whitespace to single spaces, and trims
/// the result. This is the normalization applied before any prefix is
/// inserted into or looked up in the `InstructionIndex`.
#[must_use]
pub fn normalize(s: &str) -> String {
    let lowered = s.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_space = false;
    for ch in lowered.trim().chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out
}

/// Truncates a `&str` to at most `max_chars` Unicode scalar values,
/// respecting char boundaries (never splitting a multi-byte codepoint).
#[must_use]
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Normalizes and truncates in one step — the transform applied to every
/// instruction before it is stored on a `Skeleton` or keyed into the
/// `InstructionIndex` (spec §3, Instruction glossary entry: ≤ 192 chars for
/// index keys, ≤ 200 chars for skeleton storage).
#[must_use]
pub fn normalize_and_truncate(s: &str, max_chars: usize) -> String {
    truncate_chars(&normalize(s), max_chars)
}

/// Whether `truncated_instruction` matches an empty/greeting/opening
/// pattern, or is shorter than 10 characters — the Pass 2 root-detection
/// short-circuit (spec §4.5.2 step 1).
#[must_use]
pub fn is_root_like(normalized_instruction: &str) -> bool {
    if normalized_instruction.chars().count() < 10 {
        return true;
    }
    GREETING_PREFIXES
        .iter()
        .any(|p| normalized_instruction.starts_with(p))
}

/// Splits normalized text into significant (non-stop) words, used by the
/// prefix/fuzzy similarity scorers.
#[must_use]
pub fn significant_words(normalized: &str) -> Vec<&str> {
    normalized
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w))
        .collect()
}
