//! Server name index.
//!
//! # Data Flow
//! ```text
//! Build (once per configuration generation):
//!     (pattern, value, flags)[]
//!     → keys.rs (validate, normalize, split exact / head / tail)
//!     → table.rs (size and fill the exact table)
//!     → wildcard.rs (one table per tree level, head and tail trees)
//!     → combined.rs (freeze as CombinedIndex)
//!
//! Query (per request):
//!     lowercased name
//!     → exact table → head tree → tail tree
//!     → first hit, or None
//! ```
//!
//! # Design Decisions
//! - Nothing is mutated after build; an index is shared read-only across threads
//! - Any build error discards the whole generation
//! - Values are opaque; the index never inspects them

pub mod combined;
pub mod error;
pub mod hash;
pub mod keys;
pub mod table;
pub mod wildcard;

pub use combined::{build_index, CombinedIndex, IndexStats, Match, MatchKind};
pub use error::{BuildError, PatternFault};
pub use hash::KeyCase;
pub use keys::{KeyClassifier, KeyFlags, KeysSize};
pub use table::TableLimits;
