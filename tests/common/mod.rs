//! Shared utilities for integration tests.

use std::path::PathBuf;

use tempfile::TempDir;
use vhost_index::{build_index, CombinedIndex, KeyClassifier, KeyFlags};

/// Build an index over `(pattern, value)` pairs with generous limits.
#[allow(dead_code)]
pub fn index_of(patterns: &[(&str, u32)]) -> CombinedIndex<u32> {
    let mut keys = KeyClassifier::default();
    for (key, value) in patterns {
        keys.add(*key, *value, KeyFlags::WILDCARD).unwrap();
    }
    build_index(keys, 512, 64).unwrap()
}

/// Write `content` to a config file inside a fresh temporary directory.
///
/// The directory is removed when the returned guard drops.
#[allow(dead_code)]
pub fn write_config(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vhost-index.toml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}
