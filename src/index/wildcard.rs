//! Wildcard trees.
//!
//! One tree per wildcard direction. Each node is an [`ExactTable`] keyed by
//! a single label; a slot either ends a pattern ([`Slot::Terminal`]) or
//! descends one label deeper ([`Slot::Continuation`]).
//!
//! # Lookup
//! ```text
//! head tree, "a.b.example.com":  com → example → b → a   (right to left)
//! tail tree, "www.example.net":  www → example → net     (left to right)
//! ```
//! The deepest pattern passed on the way down is the fallback when the walk
//! misses or runs out of labels.

use std::collections::HashMap;

use crate::index::error::BuildError;
use crate::index::hash::hash_key;
use crate::index::keys::WildcardKey;
use crate::index::table::{Entry, ExactTable, TableLimits};

/// Value of a pattern that ends at some depth.
#[derive(Debug)]
pub struct NodeValue<V> {
    pub value: V,
    /// Matches with no further label (`.example.com` matching `example.com`).
    /// Without it at least one more label is required.
    pub bare: bool,
}

impl<V> NodeValue<V> {
    #[inline]
    fn accepts(&self, more: bool) -> Option<&V> {
        (more || self.bare).then_some(&self.value)
    }
}

#[derive(Debug)]
pub enum Slot<V> {
    Terminal(NodeValue<V>),
    Continuation(Box<WildcardNode<V>>),
}

/// One level of a wildcard tree.
#[derive(Debug)]
pub struct WildcardNode<V> {
    table: ExactTable<Slot<V>>,
    value: Option<NodeValue<V>>,
}

struct Group<V> {
    label: Box<[u8]>,
    terminal: Option<NodeValue<V>>,
    deeper: Vec<WildcardKey<V>>,
}

impl<V> WildcardNode<V> {
    /// Build a tree from keys of one direction. `None` when there are no keys.
    pub fn build(keys: Vec<WildcardKey<V>>, limits: &TableLimits) -> Result<Option<Self>, BuildError> {
        if keys.is_empty() {
            return Ok(None);
        }
        Self::build_level(keys, limits).map(Some)
    }

    fn build_level(keys: Vec<WildcardKey<V>>, limits: &TableLimits) -> Result<Self, BuildError> {
        let mut groups: Vec<Group<V>> = Vec::new();
        let mut index: HashMap<Box<[u8]>, usize> = HashMap::new();

        for mut key in keys {
            let Some(label) = key.labels.pop() else {
                continue;
            };

            let at = if let Some(&at) = index.get(&label) {
                at
            } else {
                index.insert(label.clone(), groups.len());
                groups.push(Group {
                    label,
                    terminal: None,
                    deeper: Vec::new(),
                });
                groups.len() - 1
            };

            let group = &mut groups[at];
            if key.labels.is_empty() {
                group.terminal = Some(NodeValue {
                    value: key.value,
                    bare: key.bare,
                });
            } else {
                group.deeper.push(key);
            }
        }

        let mut entries = Vec::with_capacity(groups.len());
        for group in groups {
            let slot = match (group.terminal, group.deeper.is_empty()) {
                (Some(terminal), true) => Slot::Terminal(terminal),
                (terminal, _) => {
                    let mut child = Self::build_level(group.deeper, limits)?;
                    child.value = terminal;
                    Slot::Continuation(Box::new(child))
                }
            };
            entries.push(Entry::new(hash_key(&group.label), group.label, slot));
        }

        Ok(Self {
            table: ExactTable::build(entries, limits)?,
            value: None,
        })
    }

    /// Walk `labels` down the tree, first label first.
    pub fn find<'n>(&self, labels: impl Iterator<Item = &'n [u8]>) -> Option<&V> {
        let mut labels = labels.peekable();
        let mut node = self;
        let mut best = node.value.as_ref().map(|v| &v.value);

        while let Some(label) = labels.next() {
            let more = labels.peek().is_some();

            match node.table.find(hash_key(label), label) {
                None => return best,
                Some(Slot::Terminal(terminal)) => return terminal.accepts(more).or(best),
                Some(Slot::Continuation(child)) => {
                    let here = child.value.as_ref().and_then(|v| v.accepts(more));
                    if !more {
                        return here.or(best);
                    }
                    best = here.or(best);
                    node = &**child;
                }
            }
        }

        best
    }

    /// Match a name against a head tree, rightmost label first.
    #[inline]
    pub fn find_head(&self, name: &[u8]) -> Option<&V> {
        self.find(name.rsplit(|&c| c == b'.'))
    }

    /// Match a name against a tail tree, leftmost label first.
    #[inline]
    pub fn find_tail(&self, name: &[u8]) -> Option<&V> {
        self.find(name.split(|&c| c == b'.'))
    }

    /// Nodes in this subtree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children().map(WildcardNode::node_count).sum::<usize>()
    }

    /// Patterns stored in this subtree.
    pub fn pattern_count(&self) -> usize {
        let own = usize::from(self.value.is_some());
        own + self
            .table
            .iter()
            .map(|slot| match slot {
                Slot::Terminal(_) => 1,
                Slot::Continuation(child) => child.pattern_count(),
            })
            .sum::<usize>()
    }

    /// Summed footprint of every bucket of every table in this subtree.
    pub fn bucket_footprints(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self.table.bucket_footprints().collect();
        for child in self.children() {
            out.extend(child.bucket_footprints());
        }
        out
    }

    fn children(&self) -> impl Iterator<Item = &WildcardNode<V>> + '_ {
        self.table.iter().filter_map(|slot| match slot {
            Slot::Continuation(child) => Some(child.as_ref()),
            Slot::Terminal(_) => None,
        })
    }
}
