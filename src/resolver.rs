//! Host resolution over swappable index generations.
//!
//! # Responsibilities
//! - Build a generation (index + virtual hosts) from a validated config
//! - Publish generations atomically; readers never block
//! - Normalize incoming host names before querying
//!
//! # Design Decisions
//! - A generation owns everything its index references and is dropped as a
//!   unit once the last in-flight reader releases it
//! - A failed build leaves the current generation in place
//! - Builds are expected from one task at a time (startup or the watcher)

use std::borrow::Cow;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::config::IndexConfig;
use crate::index::{BuildError, CombinedIndex, KeyCase, KeyClassifier, KeyFlags, MatchKind};
use crate::observability::metrics;

/// A configured virtual host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualHost {
    pub name: String,
    pub server_names: Vec<String>,
}

/// Result of resolving a host name.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub host: Arc<VirtualHost>,
    /// `None` when the default host answered.
    pub matched: Option<MatchKind>,
    pub generation: u64,
}

/// One immutable build of the configuration.
#[derive(Debug)]
pub struct Generation {
    number: u64,
    index: CombinedIndex<usize>,
    hosts: Vec<Arc<VirtualHost>>,
    default_host: Option<usize>,
}

impl Generation {
    /// Classify every server name and build the index.
    pub fn build(config: &IndexConfig, number: u64) -> Result<Self, BuildError> {
        let mut keys = KeyClassifier::new(config.hash.keys, config.hash.case);
        let mut hosts = Vec::with_capacity(config.hosts.len());
        let mut default_host = None;

        for (i, host) in config.hosts.iter().enumerate() {
            for name in &host.server_names {
                keys.add(name, i, KeyFlags::WILDCARD)?;
            }
            if host.default && default_host.is_none() {
                default_host = Some(i);
            }
            hosts.push(Arc::new(VirtualHost {
                name: host.name.clone(),
                server_names: host.server_names.clone(),
            }));
        }

        let index = CombinedIndex::build(keys, &config.hash.limits())?;

        let stats = index.stats();
        tracing::info!(
            generation = number,
            hosts = hosts.len(),
            exact_keys = stats.exact_keys,
            exact_buckets = stats.exact_buckets,
            head_patterns = stats.head_patterns,
            tail_patterns = stats.tail_patterns,
            "Index generation built"
        );

        Ok(Self {
            number,
            index,
            hosts,
            default_host,
        })
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn index(&self) -> &CombinedIndex<usize> {
        &self.index
    }

    pub fn hosts(&self) -> &[Arc<VirtualHost>] {
        &self.hosts
    }

    /// Resolve a raw host name (any case, optional port or trailing dot).
    pub fn resolve(&self, host: &str) -> Option<Resolution> {
        let name = normalize_host(host, self.index.case());

        let (slot, matched) = match self.index.lookup(name.as_bytes()) {
            Some(hit) => (*hit.value, Some(hit.kind)),
            None => (self.default_host?, None),
        };

        Some(Resolution {
            host: Arc::clone(&self.hosts[slot]),
            matched,
            generation: self.number,
        })
    }
}

/// Strip whitespace, a `:port` suffix and a trailing dot; fold case if the
/// index was built case-insensitively.
pub fn normalize_host(host: &str, case: KeyCase) -> Cow<'_, str> {
    let host = host.trim();

    let host = if host.starts_with('[') {
        // Bracketed IPv6 literal; keep the brackets, drop any port.
        host.find(']').map_or(host, |end| &host[..=end])
    } else {
        match host.split_once(':') {
            Some((name, port)) if !port.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => name,
            _ => host,
        }
    };

    let host = host.strip_suffix('.').unwrap_or(host);

    if case == KeyCase::Fold && host.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(host.to_ascii_lowercase())
    } else {
        Cow::Borrowed(host)
    }
}

/// Holds the active generation and swaps it on reload.
#[derive(Debug)]
pub struct NameResolver {
    current: ArcSwap<Generation>,
}

impl NameResolver {
    /// Build the first generation. Failure here means refusing to start.
    pub fn new(config: &IndexConfig) -> Result<Self, BuildError> {
        let generation = build_recorded(config, 1)?;
        metrics::record_generation(generation.number());
        Ok(Self {
            current: ArcSwap::from_pointee(generation),
        })
    }

    /// Snapshot of the active generation.
    pub fn current(&self) -> Arc<Generation> {
        self.current.load_full()
    }

    pub fn resolve(&self, host: &str) -> Option<Resolution> {
        let resolution = self.current.load().resolve(host);
        metrics::record_lookup(match &resolution {
            Some(r) => r.matched.map_or("default", MatchKind::as_str),
            None => "none",
        });
        resolution
    }

    /// Publish `next`. Readers holding the old generation keep it until they
    /// drop their snapshot.
    pub fn swap(&self, next: Generation) -> Arc<Generation> {
        let number = next.number();
        let previous = self.current.swap(Arc::new(next));
        metrics::record_generation(number);
        tracing::info!(
            generation = number,
            previous = previous.number(),
            "Index generation published"
        );
        previous
    }

    /// Build a new generation from `config` and publish it. On error the
    /// active generation is kept.
    pub fn reload(&self, config: &IndexConfig) -> Result<u64, BuildError> {
        let number = self.current.load().number() + 1;
        let generation = build_recorded(config, number).inspect_err(|e| {
            tracing::error!(
                error = %e,
                generation = number,
                "Index build failed, keeping current generation"
            );
        })?;
        self.swap(generation);
        Ok(number)
    }
}

fn build_recorded(config: &IndexConfig, number: u64) -> Result<Generation, BuildError> {
    let result = Generation::build(config, number);
    metrics::record_build(if result.is_ok() { "ok" } else { "error" });
    result
}
