//! Build-time errors.
//!
//! Every variant aborts the generation being built. A lookup miss is not an
//! error and is reported as `None` by the query API.

use thiserror::Error;

/// Why a pattern was rejected by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFault {
    Empty,
    /// A `*` outside of a leading `*.` or trailing `.*` marker.
    MisplacedWildcard,
    /// More than one wildcard marker.
    MultipleWildcards,
    /// Wildcard marker given without the `WILDCARD` flag.
    WildcardNotAllowed,
    /// Two consecutive dots, or a dot at an edge that is not a marker.
    EmptyLabel,
    /// A marker with nothing left once it is stripped.
    NoLabels,
    NulByte,
}

impl std::fmt::Display for PatternFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            PatternFault::Empty => "empty key",
            PatternFault::MisplacedWildcard => "wildcard must be a leading \"*.\" or a trailing \".*\"",
            PatternFault::MultipleWildcards => "more than one wildcard",
            PatternFault::WildcardNotAllowed => "wildcards are not enabled for this key",
            PatternFault::EmptyLabel => "empty label",
            PatternFault::NoLabels => "wildcard without any labels",
            PatternFault::NulByte => "NUL byte in key",
        };
        f.write_str(msg)
    }
}

/// Error raised while classifying keys or building tables.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("invalid pattern \"{key}\": {fault}")]
    InvalidPattern { key: String, fault: PatternFault },

    #[error("conflicting key \"{key}\"")]
    DuplicateKey { key: String },

    #[error(
        "could not fit {entries} entries into at most {max_buckets} buckets of {max_bucket_bytes} bytes \
         (largest entry needs {largest_entry} bytes); increase max_size or bucket_size"
    )]
    CapacityExceeded {
        entries: usize,
        max_buckets: usize,
        max_bucket_bytes: usize,
        largest_entry: usize,
    },
}

impl BuildError {
    pub(crate) fn invalid(key: &[u8], fault: PatternFault) -> Self {
        BuildError::InvalidPattern {
            key: String::from_utf8_lossy(key).into_owned(),
            fault,
        }
    }

    pub(crate) fn duplicate(key: &[u8]) -> Self {
        BuildError::DuplicateKey {
            key: String::from_utf8_lossy(key).into_owned(),
        }
    }
}
