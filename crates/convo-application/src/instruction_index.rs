//! Compressed prefix tree (radix tree) over normalized instruction prefixes
//! (spec §3, §4.5.1). Keys are produced by
//! `convo_domain::utils::text::normalize_and_truncate`; node count is
//! bounded by the number of distinct meaningful prefixes rather than by
//! total character count, since shared prefixes share edges.

use std::collections::HashSet;

use convo_domain::utils::text::significant_words;
use convo_domain::value_objects::TaskId;

/// One stored (parent, original-text) pair at a radix-tree node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IndexEntry {
    parent_task_id: TaskId,
    original_instruction: String,
}

/// How an `InstructionMatch` was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// The normalized query equals a stored key exactly.
    Exact,
    /// The query and a stored key are prefixes of one another.
    Prefix,
    /// Significant-word Jaccard similarity above threshold.
    Fuzzy,
}

/// Result of looking up a query instruction against the index.
#[derive(Debug, Clone)]
pub struct InstructionMatch {
    /// Candidate parent.
    pub parent_task_id: TaskId,
    /// Similarity in `[0, 1]`.
    pub similarity_score: f64,
    /// Which matcher produced this result.
    pub match_type: MatchType,
    /// The stored key this query matched against.
    pub matched_prefix: String,
}

#[derive(Debug, Default)]
struct RadixNode {
    /// Edge label -> child. Labels are non-empty and mutually
    /// non-prefix-sharing among siblings.
    children: Vec<(String, RadixNode)>,
    /// Entries whose normalized key terminates exactly at this node.
    entries: HashSet<IndexEntry>,
}

/// Number of leading chars shared by `a` and `b`, on a char boundary.
fn common_prefix_len(a: &str, b: &str) -> usize {
    let mut len = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        len += ca.len_utf8();
    }
    len
}

impl RadixNode {
    fn insert(&mut self, key: &str, entry: IndexEntry) {
        if key.is_empty() {
            self.entries.insert(entry);
            return;
        }

        for i in 0..self.children.len() {
            let cp = common_prefix_len(&self.children[i].0, key);
            if cp == 0 {
                continue;
            }
            if cp == self.children[i].0.len() {
                self.children[i].1.insert(&key[cp..], entry);
                return;
            }

            let (old_label, old_child) = std::mem::take(&mut self.children[i]);
            let common = old_label[..cp].to_owned();
            let old_suffix = old_label[cp..].to_owned();
            let new_suffix = key[cp..].to_owned();

            let mut intermediate = RadixNode::default();
            intermediate.children.push((old_suffix, old_child));
            if new_suffix.is_empty() {
                intermediate.entries.insert(entry);
            } else {
                let mut leaf = RadixNode::default();
                leaf.entries.insert(entry);
                intermediate.children.push((new_suffix, leaf));
            }

            self.children[i] = (common, intermediate);
            return;
        }

        let mut leaf = RadixNode::default();
        leaf.entries.insert(entry);
        self.children.push((key.to_owned(), leaf));
    }

    /// Walks as far as possible matching `query`. Returns the entries at
    /// every node visited along the way whose accumulated path is itself a
    /// prefix of `query` (i.e. stored keys that are prefixes of the query),
    /// plus, if the walk consumes all of `query` partway through an edge,
    /// the entries of the node at the far end of that edge (stored keys
    /// that the query is a prefix of).
    fn collect_prefix_matches<'a>(
        &'a self,
        query: &str,
        out_key_is_prefix_of_query: &mut Vec<(String, &'a HashSet<IndexEntry>)>,
        out_query_is_prefix_of_key: &mut Vec<(String, &'a HashSet<IndexEntry>)>,
        path_so_far: &mut String,
    ) {
        if query.is_empty() {
            return;
        }
        for (label, child) in &self.children {
            let cp = common_prefix_len(label, query);
            if cp == 0 {
                continue;
            }
            path_so_far.push_str(&label[..cp]);
            if cp == label.len() {
                if !child.entries.is_empty() {
                    out_key_is_prefix_of_query.push((path_so_far.clone(), &child.entries));
                }
                if cp == query.len() {
                    // Exact node boundary; nothing further to descend.
                } else {
                    child.collect_prefix_matches(
                        &query[cp..],
                        out_key_is_prefix_of_query,
                        out_query_is_prefix_of_key,
                        path_so_far,
                    );
                }
            } else if cp == query.len() {
                // Query exhausted mid-edge: every key under this child has
                // query as a proper prefix.
                if !child.entries.is_empty() {
                    out_query_is_prefix_of_key.push((path_so_far.clone(), &child.entries));
                }
            }
            path_so_far.truncate(path_so_far.len() - cp);
            return;
        }
    }

    fn exact(&self, query: &str) -> Option<&HashSet<IndexEntry>> {
        if query.is_empty() {
            return if self.entries.is_empty() {
                None
            } else {
                Some(&self.entries)
            };
        }
        for (label, child) in &self.children {
            let cp = common_prefix_len(label, query);
            if cp == label.len() && cp > 0 {
                return child.exact(&query[cp..]);
            }
        }
        None
    }

    fn walk_all<'a>(&'a self, prefix: String, out: &mut Vec<(String, &'a HashSet<IndexEntry>)>) {
        if !self.entries.is_empty() {
            out.push((prefix.clone(), &self.entries));
        }
        for (label, child) in &self.children {
            child.walk_all(format!("{prefix}{label}"), out);
        }
    }

    fn len(&self) -> usize {
        let mut count = usize::from(!self.entries.is_empty());
        for (_, child) in &self.children {
            count += child.len();
        }
        count
    }
}

/// The compressed prefix tree (spec §3: `InstructionIndex`).
#[derive(Debug, Default)]
pub struct InstructionIndex {
    root: RadixNode,
}

impl InstructionIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `(normalized_key, parent_task_id)`, deduplicated on
    /// `(parent_task_id, original_instruction)` at that node.
    pub fn insert(&mut self, normalized_key: &str, parent_task_id: TaskId, original_instruction: String) {
        self.root.insert(
            normalized_key,
            IndexEntry {
                parent_task_id,
                original_instruction,
            },
        );
    }

    /// Number of distinct meaningful prefixes stored (spec §3: node count
    /// bounded by distinct prefixes).
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Whether the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact match: `normalized_query` equals a stored key (spec §4.5.2
    /// step 2, first bullet).
    #[must_use]
    pub fn exact_matches(&self, normalized_query: &str) -> Vec<InstructionMatch> {
        self.root
            .exact(normalized_query)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| InstructionMatch {
                        parent_task_id: e.parent_task_id.clone(),
                        similarity_score: 1.0,
                        match_type: MatchType::Exact,
                        matched_prefix: normalized_query.to_owned(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Prefix match: either string begins with the other. Score blends
    /// length overlap with significant-word overlap (spec §4.5.2 step 2,
    /// second bullet).
    #[must_use]
    pub fn prefix_matches(&self, normalized_query: &str) -> Vec<InstructionMatch> {
        let mut key_is_prefix_of_query = Vec::new();
        let mut query_is_prefix_of_key = Vec::new();
        let mut path = String::new();
        self.root.collect_prefix_matches(
            normalized_query,
            &mut key_is_prefix_of_query,
            &mut query_is_prefix_of_key,
            &mut path,
        );

        let mut out = Vec::new();
        for (key, entries) in key_is_prefix_of_query
            .into_iter()
            .chain(query_is_prefix_of_key)
        {
            let score = prefix_similarity(&key, normalized_query);
            for e in entries {
                out.push(InstructionMatch {
                    parent_task_id: e.parent_task_id.clone(),
                    similarity_score: score,
                    match_type: MatchType::Prefix,
                    matched_prefix: key.clone(),
                });
            }
        }
        out
    }

    /// Fuzzy match: symmetric significant-word Jaccard similarity with a
    /// length penalty, across every stored key (spec §4.5.2 step 2, third
    /// bullet). `threshold` is the minimum similarity to include.
    #[must_use]
    pub fn fuzzy_matches(&self, normalized_query: &str, threshold: f64) -> Vec<InstructionMatch> {
        let mut all = Vec::new();
        self.root.walk_all(String::new(), &mut all);

        let query_words: HashSet<&str> = significant_words(normalized_query).into_iter().collect();
        let mut out = Vec::new();
        for (key, entries) in all {
            let score = fuzzy_similarity(&query_words, normalized_query, &key);
            if score < threshold {
                continue;
            }
            for e in entries {
                out.push(InstructionMatch {
                    parent_task_id: e.parent_task_id.clone(),
                    similarity_score: score,
                    match_type: MatchType::Fuzzy,
                    matched_prefix: key.clone(),
                });
            }
        }
        out
    }
}

/// Length-overlap/significant-word blend used for prefix matches. Weighted
/// 0.6 length overlap / 0.4 word overlap; both terms are symmetric so
/// direction (key-in-query vs query-in-key) doesn't matter.
fn prefix_similarity(key: &str, query: &str) -> f64 {
    let shorter = key.chars().count().min(query.chars().count()) as f64;
    let longer = key.chars().count().max(query.chars().count()).max(1) as f64;
    let length_overlap = shorter / longer;

    let key_words: HashSet<&str> = significant_words(key).into_iter().collect();
    let query_words: HashSet<&str> = significant_words(query).into_iter().collect();
    let word_overlap = jaccard(&key_words, &query_words);

    (0.6 * length_overlap + 0.4 * word_overlap).clamp(0.0, 1.0)
}

/// Symmetric Jaccard similarity over significant words, penalized when the
/// two normalized strings differ sharply in length (spec §4.5.2 step 2,
/// third bullet: "length penalty").
fn fuzzy_similarity(query_words: &HashSet<&str>, normalized_query: &str, key: &str) -> f64 {
    let key_words: HashSet<&str> = significant_words(key).into_iter().collect();
    let word_similarity = jaccard(query_words, &key_words);

    let shorter = key.chars().count().min(normalized_query.chars().count()) as f64;
    let longer = key
        .chars()
        .count()
        .max(normalized_query.chars().count())
        .max(1) as f64;
    let length_penalty = shorter / longer;

    word_similarity * length_penalty
}

fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tid(s: &str) -> TaskId {
        TaskId::new(s)
    }

    #[test]
    fn exact_match_returns_full_confidence() {
        let mut idx = InstructionIndex::new();
        idx.insert("write a unit test for the parser", tid("parent-1"), "write a unit test for the parser".to_owned());

        let matches = idx.exact_matches("write a unit test for the parser");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].parent_task_id, tid("parent-1"));
        assert_eq!(matches[0].similarity_score, 1.0);
        assert_eq!(matches[0].match_type, MatchType::Exact);
    }

    #[test]
    fn shared_prefixes_coalesce_into_shared_edges() {
        let mut idx = InstructionIndex::new();
        idx.insert("write a unit test for the parser", tid("a"), "..".to_owned());
        idx.insert("write a unit test for the lexer", tid("b"), "..".to_owned());
        // Two distinct meaningful prefixes -> two leaves, regardless of the
        // shared "write a unit test for the " edge.
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn prefix_match_when_query_extends_stored_key() {
        let mut idx = InstructionIndex::new();
        idx.insert("refactor the payment retry loop", tid("parent-1"), "refactor the payment retry loop".to_owned());

        let matches = idx.prefix_matches("refactor the payment retry loop to use backoff");
        assert!(matches.iter().any(|m| m.parent_task_id == tid("parent-1")));
        assert!(matches[0].similarity_score > 0.0);
    }

    #[test]
    fn fuzzy_match_below_threshold_is_excluded() {
        let mut idx = InstructionIndex::new();
        idx.insert("completely unrelated database migration task", tid("x"), "..".to_owned());

        let matches = idx.fuzzy_matches("refactor the payment retry loop", 0.2);
        assert!(matches.is_empty());
    }

    #[test]
    fn fuzzy_match_above_threshold_is_included() {
        let mut idx = InstructionIndex::new();
        idx.insert("fix payment retry bug in checkout", tid("x"), "..".to_owned());

        let matches = idx.fuzzy_matches("payment retry bug fix", 0.2);
        assert!(matches.iter().any(|m| m.parent_task_id == tid("x")));
    }
}
