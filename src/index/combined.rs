//! The combined index and its lookup.
//!
//! # Priority
//! ```text
//! 1. exact table     "www.example.com"
//! 2. head wildcards  "*.example.com", ".example.com"
//! 3. tail wildcards  "www.example.*"
//! ```
//! First hit wins. Categories are never compared for specificity.

use serde::Serialize;

use crate::index::error::BuildError;
use crate::index::hash::KeyCase;
use crate::index::keys::KeyClassifier;
use crate::index::table::{ExactTable, TableLimits};
use crate::index::wildcard::WildcardNode;

/// Which category produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    HeadWildcard,
    TailWildcard,
}

impl MatchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::HeadWildcard => "head_wildcard",
            MatchKind::TailWildcard => "tail_wildcard",
        }
    }
}

/// A successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a, V> {
    pub kind: MatchKind,
    pub value: &'a V,
}

/// Shape of a built index, for logs and the `check` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IndexStats {
    pub exact_keys: usize,
    pub exact_buckets: usize,
    pub head_patterns: usize,
    pub head_nodes: usize,
    pub tail_patterns: usize,
    pub tail_nodes: usize,
}

/// Immutable name index: exact table plus head and tail wildcard trees.
#[derive(Debug)]
pub struct CombinedIndex<V> {
    exact: Option<ExactTable<V>>,
    head: Option<WildcardNode<V>>,
    tail: Option<WildcardNode<V>>,
    case: KeyCase,
}

impl<V> CombinedIndex<V> {
    /// Build every table from the classified keys.
    pub fn build(keys: KeyClassifier<V>, limits: &TableLimits) -> Result<Self, BuildError> {
        let parts = keys.into_parts();

        let exact = if parts.exact.is_empty() {
            None
        } else {
            Some(ExactTable::build(parts.exact, limits)?)
        };

        Ok(Self {
            exact,
            head: WildcardNode::build(parts.head, limits)?,
            tail: WildcardNode::build(parts.tail, limits)?,
            case: parts.case,
        })
    }

    /// Resolve `name` and report which category matched.
    ///
    /// `name` must already be in the form keys were normalized to: lowercase
    /// under [`KeyCase::Fold`], as-is under [`KeyCase::Preserve`].
    pub fn lookup(&self, name: &[u8]) -> Option<Match<'_, V>> {
        if name.is_empty() {
            return None;
        }

        let hash = self.case.hash(name);
        if let Some(value) = self.exact.as_ref().and_then(|t| t.find(hash, name)) {
            return Some(Match {
                kind: MatchKind::Exact,
                value,
            });
        }

        if let Some(value) = self.head.as_ref().and_then(|t| t.find_head(name)) {
            return Some(Match {
                kind: MatchKind::HeadWildcard,
                value,
            });
        }

        self.tail
            .as_ref()
            .and_then(|t| t.find_tail(name))
            .map(|value| Match {
                kind: MatchKind::TailWildcard,
                value,
            })
    }

    /// Resolve `name` to its value.
    #[inline]
    pub fn query(&self, name: impl AsRef<[u8]>) -> Option<&V> {
        self.lookup(name.as_ref()).map(|m| m.value)
    }

    pub fn case(&self) -> KeyCase {
        self.case
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_none() && self.head.is_none() && self.tail.is_none()
    }

    pub fn exact_table(&self) -> Option<&ExactTable<V>> {
        self.exact.as_ref()
    }

    /// Footprint of every bucket in every table of the index.
    pub fn bucket_footprints(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .exact
            .iter()
            .flat_map(|t| t.bucket_footprints())
            .collect();
        for tree in self.head.iter().chain(self.tail.iter()) {
            out.extend(tree.bucket_footprints());
        }
        out
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            exact_keys: self.exact.as_ref().map_or(0, ExactTable::len),
            exact_buckets: self.exact.as_ref().map_or(0, ExactTable::size),
            head_patterns: self.head.as_ref().map_or(0, WildcardNode::pattern_count),
            head_nodes: self.head.as_ref().map_or(0, WildcardNode::node_count),
            tail_patterns: self.tail.as_ref().map_or(0, WildcardNode::pattern_count),
            tail_nodes: self.tail.as_ref().map_or(0, WildcardNode::node_count),
        }
    }
}

/// Build an index with explicit capacity limits.
pub fn build_index<V>(
    keys: KeyClassifier<V>,
    max_bucket_count: usize,
    max_bucket_byte_size: usize,
) -> Result<CombinedIndex<V>, BuildError> {
    let limits = TableLimits {
        max_buckets: max_bucket_count,
        max_bucket_bytes: max_bucket_byte_size,
    };
    CombinedIndex::build(keys, &limits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::keys::KeyFlags;

    fn index(patterns: &[(&str, u32)]) -> CombinedIndex<u32> {
        let mut keys = KeyClassifier::default();
        for (key, value) in patterns {
            keys.add(*key, *value, KeyFlags::WILDCARD).unwrap();
        }
        build_index(keys, 512, 64).unwrap()
    }

    #[test]
    fn test_priority_exact_then_head_then_tail() {
        let idx = index(&[("www.a.com", 1), ("*.a.com", 2), ("www.a.*", 3)]);

        let hit = idx.lookup(b"www.a.com").unwrap();
        assert_eq!((hit.kind, *hit.value), (MatchKind::Exact, 1));

        let hit = idx.lookup(b"foo.a.com").unwrap();
        assert_eq!((hit.kind, *hit.value), (MatchKind::HeadWildcard, 2));

        let hit = idx.lookup(b"www.a.net").unwrap();
        assert_eq!((hit.kind, *hit.value), (MatchKind::TailWildcard, 3));
    }

    #[test]
    fn test_head_wins_over_more_specific_tail() {
        let idx = index(&[("*.com", 1), ("www.example.*", 2)]);
        assert_eq!(idx.query("www.example.com"), Some(&1));
        assert_eq!(idx.query("www.example.org"), Some(&2));
    }

    #[test]
    fn test_exact_shadows_dot_wildcard_on_bare_name() {
        let idx = index(&[("example.com", 1), (".example.com", 2)]);
        assert_eq!(idx.query("example.com"), Some(&1));
        assert_eq!(idx.query("www.example.com"), Some(&2));
    }

    #[test]
    fn test_empty_index_misses_everything() {
        let idx: CombinedIndex<u32> = build_index(KeyClassifier::default(), 512, 64).unwrap();
        assert!(idx.is_empty());
        assert_eq!(idx.query("example.com"), None);
        assert_eq!(idx.query(""), None);
        assert_eq!(idx.stats(), IndexStats::default());
    }

    #[test]
    fn test_empty_name_is_not_found() {
        let idx = index(&[(".example.com", 1), ("example.*", 2)]);
        assert_eq!(idx.query(""), None);
    }

    #[test]
    fn test_query_does_not_fold_case() {
        let idx = index(&[("WWW.Example.COM", 1)]);
        assert_eq!(idx.query("www.example.com"), Some(&1));
        assert_eq!(idx.query("WWW.Example.COM"), None);
    }

    #[test]
    fn test_fold_hash_lands_uppercase_query_in_right_bucket() {
        // Same bucket as the stored key, but the bytes still have to match.
        let idx = index(&[("example.com", 1)]);
        let table = idx.exact_table().unwrap();
        assert_eq!(table.find(KeyCase::Fold.hash(b"EXAMPLE.com"), b"example.com"), Some(&1));
        assert_eq!(idx.query("EXAMPLE.com"), None);
    }

    #[test]
    fn test_preserve_case_index() {
        let mut keys = KeyClassifier::new(crate::index::KeysSize::Small, KeyCase::Preserve);
        keys.add("Example.com", 1, KeyFlags::WILDCARD).unwrap();
        keys.add("*.Example.com", 2, KeyFlags::WILDCARD).unwrap();
        let idx = build_index(keys, 512, 64).unwrap();

        assert_eq!(idx.case(), KeyCase::Preserve);
        assert_eq!(idx.query("Example.com"), Some(&1));
        assert_eq!(idx.query("example.com"), None);
        assert_eq!(idx.query("www.Example.com"), Some(&2));
        assert_eq!(idx.query("www.example.com"), None);
    }

    #[test]
    fn test_stats() {
        let idx = index(&[("a.com", 1), ("b.com", 2), ("*.a.com", 3), ("a.*", 4)]);
        let stats = idx.stats();
        assert_eq!(stats.exact_keys, 2);
        assert!(stats.exact_buckets >= 1);
        assert_eq!(stats.head_patterns, 1);
        assert_eq!(stats.head_nodes, 2);
        assert_eq!(stats.tail_patterns, 1);
        assert_eq!(stats.tail_nodes, 1);
    }

    #[test]
    fn test_capacity_error_surfaces_from_wildcard_level() {
        let mut keys = KeyClassifier::default();
        keys.add("*.a-rather-long-label-for-a-small-bucket.com", 1, KeyFlags::WILDCARD)
            .unwrap();
        let err = build_index(keys, 512, 32).unwrap_err();
        assert!(matches!(err, BuildError::CapacityExceeded { .. }));
    }
}
