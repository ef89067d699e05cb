//! Virtual host name index.
//!
//! Maps host names to configured virtual hosts through exact names,
//! leading wildcards (`*.example.com`, `.example.com`) and trailing
//! wildcards (`www.example.*`).

pub mod config;
pub mod index;
pub mod observability;
pub mod resolver;

pub use config::IndexConfig;
pub use index::{build_index, BuildError, CombinedIndex, KeyClassifier, KeyFlags, MatchKind};
pub use resolver::{Generation, NameResolver, Resolution};
