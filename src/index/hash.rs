//! Key hashing and case normalization.
//!
//! Every hash in the index is `h = h * 31 + byte`, folded over the key
//! bytes with wrapping arithmetic. Build and query must agree on it, so the
//! classifier hashes normalized bytes and the lookup hashes the query with
//! the same [`KeyCase`]. Key bytes are still compared exactly.

use serde::{Deserialize, Serialize};

/// One step of the rolling hash.
#[inline]
pub const fn hash_step(key: u64, c: u8) -> u64 {
    key.wrapping_mul(31).wrapping_add(c as u64)
}

/// Hash the bytes exactly as given.
#[inline]
pub fn hash_key(data: &[u8]) -> u64 {
    data.iter().fold(0, |key, &c| hash_step(key, c))
}

/// Hash the bytes as if they were ASCII-lowercased.
#[inline]
pub fn hash_key_lc(data: &[u8]) -> u64 {
    data.iter()
        .fold(0, |key, &c| hash_step(key, c.to_ascii_lowercase()))
}

/// Lowercase `src` into a new buffer and return it together with its hash.
pub fn strlow(src: &[u8]) -> (Vec<u8>, u64) {
    let mut key = 0;
    let dst = src
        .iter()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            key = hash_step(key, c);
            c
        })
        .collect();
    (dst, key)
}

/// Build-time hash strategy.
///
/// Fixed for the lifetime of a classifier and the index built from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCase {
    /// Keys are ASCII-lowercased on registration; queries must be lowercase.
    #[default]
    Fold,
    /// Keys are stored byte-for-byte; matching is case-sensitive.
    Preserve,
}

impl KeyCase {
    /// Normalize a key component and hash the result.
    pub fn normalize(self, src: &[u8]) -> (Vec<u8>, u64) {
        match self {
            KeyCase::Fold => strlow(src),
            KeyCase::Preserve => (src.to_vec(), hash_key(src)),
        }
    }

    /// Hash a key component the way [`KeyCase::normalize`] would.
    pub fn hash(self, src: &[u8]) -> u64 {
        match self {
            KeyCase::Fold => hash_key_lc(src),
            KeyCase::Preserve => hash_key(src),
        }
    }
}
