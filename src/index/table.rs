//! Exact-match hash table.
//!
//! # Responsibilities
//! - Pick the smallest bucket count that keeps every bucket under the byte limit
//! - Lay entries out in buckets, keeping insertion order
//! - Byte-exact lookup by precomputed hash
//!
//! # Design Decisions
//! - Sizing runs once per table at build time; lookups never resize
//! - Buckets are dense slices, scanned linearly
//! - An empty table has zero buckets and misses every lookup

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::index::error::BuildError;

/// Fixed per-entry cost counted against a bucket's byte budget.
pub const ENTRY_OVERHEAD: usize = 16;

/// Capacity constraints for every table in one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TableLimits {
    /// Upper bound on the bucket count.
    pub max_buckets: usize,
    /// Upper bound on the summed footprint of one bucket.
    pub max_bucket_bytes: usize,
}

impl Default for TableLimits {
    fn default() -> Self {
        Self {
            max_buckets: 512,
            max_bucket_bytes: 64,
        }
    }
}

/// A normalized key with its hash and value.
#[derive(Debug)]
pub struct Entry<V> {
    pub hash: u64,
    pub key: Box<[u8]>,
    pub value: V,
}

impl<V> Entry<V> {
    pub fn new(hash: u64, key: impl Into<Box<[u8]>>, value: V) -> Self {
        Self {
            hash,
            key: key.into(),
            value,
        }
    }

    /// Bytes this entry occupies in its bucket.
    #[inline]
    pub fn footprint(&self) -> usize {
        ENTRY_OVERHEAD + self.key.len()
    }
}

/// Immutable hash table built by [`ExactTable::build`].
#[derive(Debug)]
pub struct ExactTable<V> {
    buckets: Box<[Box<[Entry<V>]>]>,
    len: usize,
}

impl<V> ExactTable<V> {
    /// A table with no buckets.
    pub fn empty() -> Self {
        Self {
            buckets: Box::default(),
            len: 0,
        }
    }

    /// Distribute `entries` over the smallest bucket count satisfying `limits`.
    pub fn build(entries: Vec<Entry<V>>, limits: &TableLimits) -> Result<Self, BuildError> {
        if entries.is_empty() {
            return Ok(Self::empty());
        }

        let size = bucket_count(&entries, limits)?;
        let len = entries.len();

        let mut buckets: Vec<Vec<Entry<V>>> = (0..size).map(|_| Vec::new()).collect();
        for entry in entries {
            let slot = (entry.hash % size as u64) as usize;
            buckets[slot].push(entry);
        }

        tracing::debug!(
            entries = len,
            buckets = size,
            max_buckets = limits.max_buckets,
            max_bucket_bytes = limits.max_bucket_bytes,
            "Hash table sized"
        );

        Ok(Self {
            buckets: buckets.into_iter().map(Vec::into_boxed_slice).collect(),
            len,
        })
    }

    /// Find the value stored under `key`, whose hash is `hash`.
    #[inline]
    pub fn find(&self, hash: u64, key: &[u8]) -> Option<&V> {
        if self.buckets.is_empty() {
            return None;
        }
        let bucket = &self.buckets[(hash % self.buckets.len() as u64) as usize];
        bucket
            .iter()
            .find(|e| e.key.len() == key.len() && *e.key == *key)
            .map(|e| &e.value)
    }

    /// Number of buckets.
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Values in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = &V> + '_ {
        self.buckets.iter().flat_map(|b| b.iter().map(|e| &e.value))
    }

    /// Summed entry footprint of each bucket, in bucket order.
    pub fn bucket_footprints(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets
            .iter()
            .map(|b| b.iter().map(Entry::footprint).sum())
    }

    #[cfg(test)]
    fn entries(&self) -> impl Iterator<Item = &Entry<V>> + '_ {
        self.buckets.iter().flat_map(|b| b.iter())
    }
}

/// Smallest bucket count in `[1, max_buckets]` that fits every entry.
fn bucket_count<V>(entries: &[Entry<V>], limits: &TableLimits) -> Result<usize, BuildError> {
    let largest = entries.iter().map(Entry::footprint).max().unwrap_or(0);
    let exceeded = || BuildError::CapacityExceeded {
        entries: entries.len(),
        max_buckets: limits.max_buckets,
        max_bucket_bytes: limits.max_bucket_bytes,
        largest_entry: largest,
    };

    if largest > limits.max_bucket_bytes {
        return Err(exceeded());
    }

    // No entry costs less than ENTRY_OVERHEAD, so no bucket holds more than
    // this many; smaller tables cannot fit all entries.
    let per_bucket = (limits.max_bucket_bytes / ENTRY_OVERHEAD).max(1);
    let start = (entries.len() / per_bucket).max(1);

    // Entries sharing a full hash share a bucket at every size.
    let mut same_hash: HashMap<u64, usize> = HashMap::new();
    for entry in entries {
        let total = same_hash.entry(entry.hash).or_default();
        *total += entry.footprint();
        if *total > limits.max_bucket_bytes {
            return Err(exceeded());
        }
    }

    let mut used = Vec::new();

    'sizes: for size in start..=limits.max_buckets {
        used.clear();
        used.resize(size, 0usize);
        for entry in entries {
            let slot = (entry.hash % size as u64) as usize;
            used[slot] += entry.footprint();
            if used[slot] > limits.max_bucket_bytes {
                continue 'sizes;
            }
        }
        return Ok(size);
    }

    Err(exceeded())
}
