//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (bucket limits, addresses)
//! - Detect conflicting host definitions
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: IndexConfig → Result<(), Vec<ValidationError>>
//! - Pattern syntax is left to the index build, which reports the offending key

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::IndexConfig;
use crate::index::table::ENTRY_OVERHEAD;

/// Largest accepted `bucket_size`.
pub const MAX_BUCKET_SIZE: usize = 65536;

/// Largest accepted `max_size`.
pub const MAX_HASH_SIZE: usize = 1 << 20;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("hash.max_size must be greater than zero")]
    ZeroMaxSize,

    #[error("hash.max_size {0} exceeds {max}", max = MAX_HASH_SIZE)]
    MaxSizeTooLarge(usize),

    #[error("hash.bucket_size {0} is out of range ({min}..={max})", min = ENTRY_OVERHEAD + 1, max = MAX_BUCKET_SIZE)]
    BucketSizeOutOfRange(usize),

    #[error("duplicate host name \"{0}\"")]
    DuplicateHost(String),

    #[error("host \"{0}\" has no server names")]
    NoServerNames(String),

    #[error("more than one default host: {0:?}")]
    MultipleDefaults(Vec<String>),

    #[error("invalid metrics address \"{0}\"")]
    MetricsAddress(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &IndexConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.hash.max_size == 0 {
        errors.push(ValidationError::ZeroMaxSize);
    } else if config.hash.max_size > MAX_HASH_SIZE {
        errors.push(ValidationError::MaxSizeTooLarge(config.hash.max_size));
    }
    if config.hash.bucket_size <= ENTRY_OVERHEAD || config.hash.bucket_size > MAX_BUCKET_SIZE {
        errors.push(ValidationError::BucketSizeOutOfRange(config.hash.bucket_size));
    }

    let mut seen = HashSet::new();
    for host in &config.hosts {
        if !seen.insert(host.name.as_str()) {
            errors.push(ValidationError::DuplicateHost(host.name.clone()));
        }
        if host.server_names.is_empty() && !host.default {
            errors.push(ValidationError::NoServerNames(host.name.clone()));
        }
    }

    let defaults: Vec<String> = config
        .hosts
        .iter()
        .filter(|h| h.default)
        .map(|h| h.name.clone())
        .collect();
    if defaults.len() > 1 {
        errors.push(ValidationError::MultipleDefaults(defaults));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
