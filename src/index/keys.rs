//! Key classification.
//!
//! # Responsibilities
//! - Validate raw patterns and reject malformed wildcards
//! - Normalize case according to the build-time [`KeyCase`]
//! - Split keys into exact, head-wildcard, and tail-wildcard groups
//! - Detect conflicting registrations before any table is built
//!
//! # Supported Shapes
//! ```text
//! www.example.com     exact
//! *.example.com       head wildcard, one or more labels in front
//! .example.com        head wildcard, zero or more labels in front
//! www.example.*       tail wildcard, one or more labels behind
//! ```

use serde::{Deserialize, Serialize};

use crate::index::error::{BuildError, PatternFault};
use crate::index::hash::KeyCase;
use crate::index::table::Entry;

bitflags::bitflags! {
    /// Per-key registration flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyFlags: u8 {
        /// Recognize `*.`, `.` and `.*` markers.
        const WILDCARD = 1 << 0;
        /// Registering the same raw key again is a no-op instead of a conflict,
        /// provided both registrations carry this flag.
        const READ_ONLY = 1 << 1;
    }
}

/// Width of the scratch tables used for conflict detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeysSize {
    #[default]
    Small,
    Large,
}

impl KeysSize {
    fn slots(self) -> usize {
        match self {
            KeysSize::Small => 107,
            KeysSize::Large => 10007,
        }
    }
}

/// A wildcard key reduced to its label path.
///
/// `labels` is stored innermost-last: the next label to consume is at the
/// back, so descent is a `pop`.
#[derive(Debug)]
pub struct WildcardKey<V> {
    pub labels: Vec<Box<[u8]>>,
    pub value: V,
    /// Also matches when no label is left beyond the path (`.example.com`).
    pub bare: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape<'a> {
    Exact,
    Head { body: &'a [u8], bare: bool },
    Tail { body: &'a [u8] },
}

fn classify(key: &[u8], flags: KeyFlags) -> Result<Shape<'_>, PatternFault> {
    if key.is_empty() {
        return Err(PatternFault::Empty);
    }
    if key.contains(&0) {
        return Err(PatternFault::NulByte);
    }
    if key.iter().filter(|&&c| c == b'*').count() > 1 {
        return Err(PatternFault::MultipleWildcards);
    }

    let (shape, body) = if let Some(body) = key.strip_prefix(b"*.") {
        (Shape::Head { body, bare: false }, body)
    } else if let Some(body) = key.strip_prefix(b".") {
        (Shape::Head { body, bare: true }, body)
    } else if let Some(body) = key.strip_suffix(b".*") {
        (Shape::Tail { body }, body)
    } else {
        (Shape::Exact, key)
    };

    if shape != Shape::Exact {
        if !flags.contains(KeyFlags::WILDCARD) {
            return Err(PatternFault::WildcardNotAllowed);
        }
        if matches!(shape, Shape::Head { .. }) && body.ends_with(b".*") {
            return Err(PatternFault::MultipleWildcards);
        }
    }
    if body.contains(&b'*') {
        return Err(PatternFault::MisplacedWildcard);
    }
    if body.is_empty() {
        return Err(PatternFault::NoLabels);
    }
    if body.split(|&c| c == b'.').any(<[u8]>::is_empty) {
        return Err(PatternFault::EmptyLabel);
    }

    Ok(shape)
}

#[derive(Debug)]
struct SeenKey {
    key: Box<[u8]>,
    raw: Box<[u8]>,
    read_only: bool,
}

/// Scratch table of already registered keys, bucketed by hash.
#[derive(Debug)]
struct SeenKeys {
    slots: Vec<Vec<SeenKey>>,
}

impl SeenKeys {
    fn new(size: KeysSize) -> Self {
        Self {
            slots: (0..size.slots()).map(|_| Vec::new()).collect(),
        }
    }

    /// Record `key`. Returns `Ok(false)` for a tolerated read-only repeat.
    fn register(&mut self, hash: u64, key: &[u8], raw: &[u8], read_only: bool) -> Result<bool, BuildError> {
        let slot = (hash % self.slots.len() as u64) as usize;
        let bucket = &mut self.slots[slot];

        if let Some(seen) = bucket.iter().find(|s| *s.key == *key) {
            if seen.read_only && read_only && *seen.raw == *raw {
                return Ok(false);
            }
            return Err(BuildError::duplicate(raw));
        }

        bucket.push(SeenKey {
            key: key.into(),
            raw: raw.into(),
            read_only,
        });
        Ok(true)
    }
}

/// Collects patterns for one build generation.
#[derive(Debug)]
pub struct KeyClassifier<V> {
    case: KeyCase,
    exact: Vec<Entry<V>>,
    head: Vec<WildcardKey<V>>,
    tail: Vec<WildcardKey<V>>,
    exact_seen: SeenKeys,
    head_seen: SeenKeys,
    tail_seen: SeenKeys,
}

/// What a classifier hands to the table builders.
#[derive(Debug)]
pub struct ClassifiedKeys<V> {
    pub case: KeyCase,
    pub exact: Vec<Entry<V>>,
    pub head: Vec<WildcardKey<V>>,
    pub tail: Vec<WildcardKey<V>>,
}

impl<V> KeyClassifier<V> {
    pub fn new(size: KeysSize, case: KeyCase) -> Self {
        Self {
            case,
            exact: Vec::new(),
            head: Vec::new(),
            tail: Vec::new(),
            exact_seen: SeenKeys::new(size),
            head_seen: SeenKeys::new(size),
            tail_seen: SeenKeys::new(size),
        }
    }

    /// Register `key` with `value`.
    ///
    /// Any error means the generation must be discarded; the classifier is
    /// left unchanged by a rejected key.
    pub fn add(&mut self, key: impl AsRef<[u8]>, value: V, flags: KeyFlags) -> Result<(), BuildError> {
        let raw = key.as_ref();
        let shape = classify(raw, flags).map_err(|fault| BuildError::invalid(raw, fault))?;
        let read_only = flags.contains(KeyFlags::READ_ONLY);

        match shape {
            Shape::Exact => {
                let (key, hash) = self.case.normalize(raw);
                if self.exact_seen.register(hash, &key, raw, read_only)? {
                    self.exact.push(Entry::new(hash, key, value));
                }
            }
            Shape::Head { body, bare } => {
                let (key, hash) = self.case.normalize(body);
                if self.head_seen.register(hash, &key, raw, read_only)? {
                    // Rightmost label is consumed first.
                    let labels = key.split(|&c| c == b'.').map(Box::from).collect();
                    self.head.push(WildcardKey { labels, value, bare });
                }
            }
            Shape::Tail { body } => {
                let (key, hash) = self.case.normalize(body);
                if self.tail_seen.register(hash, &key, raw, read_only)? {
                    let labels = key.rsplit(|&c| c == b'.').map(Box::from).collect();
                    self.tail.push(WildcardKey {
                        labels,
                        value,
                        bare: false,
                    });
                }
            }
        }

        Ok(())
    }

    /// Number of accepted registrations across all groups.
    pub fn len(&self) -> usize {
        self.exact.len() + self.head.len() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_parts(self) -> ClassifiedKeys<V> {
        ClassifiedKeys {
            case: self.case,
            exact: self.exact,
            head: self.head,
            tail: self.tail,
        }
    }
}

impl<V> Default for KeyClassifier<V> {
    fn default() -> Self {
        Self::new(KeysSize::default(), KeyCase::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::hash::hash_key;

    fn labels<V>(key: &WildcardKey<V>) -> Vec<String> {
        key.labels
            .iter()
            .rev()
            .map(|l| String::from_utf8_lossy(l).into_owned())
            .collect()
    }

    #[test]
    fn test_exact_key_is_lowercased_and_hashed() {
        let mut keys = KeyClassifier::default();
        keys.add("WWW.Example.COM", 1, KeyFlags::WILDCARD).unwrap();

        let parts = keys.into_parts();
        assert_eq!(parts.exact.len(), 1);
        assert_eq!(&*parts.exact[0].key, b"www.example.com");
        assert_eq!(parts.exact[0].hash, hash_key(b"www.example.com"));
    }

    #[test]
    fn test_preserve_case_keeps_bytes() {
        let mut keys = KeyClassifier::new(KeysSize::Small, KeyCase::Preserve);
        keys.add("Example.com", 1, KeyFlags::empty()).unwrap();
        keys.add("example.com", 2, KeyFlags::empty()).unwrap();
        assert_eq!(keys.into_parts().exact.len(), 2);
    }

    #[test]
    fn test_head_labels_are_consumed_right_to_left() {
        let mut keys = KeyClassifier::default();
        keys.add("*.www.example.com", 1, KeyFlags::WILDCARD).unwrap();
        keys.add(".example.org", 2, KeyFlags::WILDCARD).unwrap();

        let parts = keys.into_parts();
        assert_eq!(labels(&parts.head[0]), ["com", "example", "www"]);
        assert!(!parts.head[0].bare);
        assert_eq!(labels(&parts.head[1]), ["org", "example"]);
        assert!(parts.head[1].bare);
    }

    #[test]
    fn test_tail_labels_are_consumed_left_to_right() {
        let mut keys = KeyClassifier::default();
        keys.add("www.Example.*", 1, KeyFlags::WILDCARD).unwrap();

        let parts = keys.into_parts();
        assert_eq!(labels(&parts.tail[0]), ["www", "example"]);
        assert!(!parts.tail[0].bare);
    }

    #[test]
    fn test_malformed_patterns_are_rejected() {
        let cases: &[(&str, PatternFault)] = &[
            ("", PatternFault::Empty),
            ("*", PatternFault::MisplacedWildcard),
            ("www.*.com", PatternFault::MisplacedWildcard),
            ("w*w.example.com", PatternFault::MisplacedWildcard),
            ("*.example.*", PatternFault::MultipleWildcards),
            (".example.*", PatternFault::MultipleWildcards),
            ("*.", PatternFault::NoLabels),
            (".", PatternFault::NoLabels),
            ("a..b", PatternFault::EmptyLabel),
            ("example.com.", PatternFault::EmptyLabel),
            ("*..example.com", PatternFault::EmptyLabel),
            ("..example.*", PatternFault::MultipleWildcards),
            ("a\0b", PatternFault::NulByte),
        ];

        for (key, fault) in cases {
            let mut keys = KeyClassifier::default();
            let err = keys.add(*key, (), KeyFlags::WILDCARD).unwrap_err();
            assert_eq!(
                err,
                BuildError::InvalidPattern {
                    key: key.to_string(),
                    fault: *fault
                },
                "key {key:?}"
            );
            assert!(keys.is_empty());
        }
    }

    #[test]
    fn test_wildcard_requires_flag() {
        let mut keys = KeyClassifier::default();
        for key in ["*.example.com", ".example.com", "www.example.*"] {
            let err = keys.add(key, (), KeyFlags::empty()).unwrap_err();
            assert!(matches!(
                err,
                BuildError::InvalidPattern {
                    fault: PatternFault::WildcardNotAllowed,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_duplicate_exact_key_is_rejected() {
        let mut keys = KeyClassifier::default();
        keys.add("a.com", 1, KeyFlags::WILDCARD).unwrap();
        let err = keys.add("A.COM", 2, KeyFlags::WILDCARD).unwrap_err();
        assert_eq!(err, BuildError::DuplicateKey { key: "A.COM".into() });
    }

    #[test]
    fn test_read_only_repeat_is_a_noop() {
        let mut keys = KeyClassifier::default();
        keys.add("a.com", 1, KeyFlags::READ_ONLY).unwrap();
        keys.add("a.com", 2, KeyFlags::READ_ONLY).unwrap();

        let parts = keys.into_parts();
        assert_eq!(parts.exact.len(), 1);
        assert_eq!(parts.exact[0].value, 1);
    }

    #[test]
    fn test_read_only_needs_both_sides_and_same_bytes() {
        let mut keys = KeyClassifier::default();
        keys.add("a.com", 1, KeyFlags::READ_ONLY).unwrap();
        assert!(keys.add("a.com", 2, KeyFlags::empty()).is_err());
        assert!(keys.add("A.com", 2, KeyFlags::READ_ONLY).is_err());
    }

    #[test]
    fn test_head_wildcard_forms_conflict() {
        let mut keys = KeyClassifier::default();
        keys.add("*.example.com", 1, KeyFlags::WILDCARD).unwrap();
        let err = keys.add(".example.com", 2, KeyFlags::WILDCARD).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateKey { .. }));
    }

    #[test]
    fn test_exact_and_dot_wildcard_coexist() {
        let mut keys = KeyClassifier::default();
        keys.add("example.com", 1, KeyFlags::WILDCARD).unwrap();
        keys.add(".example.com", 2, KeyFlags::WILDCARD).unwrap();
        keys.add("example.*", 3, KeyFlags::WILDCARD).unwrap();
        assert_eq!(keys.len(), 3);
    }
}
