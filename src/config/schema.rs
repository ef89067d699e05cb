//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};

use crate::index::{KeyCase, KeysSize, TableLimits};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IndexConfig {
    /// Hash table sizing and key handling.
    pub hash: HashConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Virtual hosts and the server names that select them.
    pub hosts: Vec<HostConfig>,
}

/// Hash table configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HashConfig {
    /// Maximum number of buckets per table.
    pub max_size: usize,

    /// Maximum bytes per bucket.
    pub bucket_size: usize,

    /// Scratch table width used while collecting keys.
    pub keys: KeysSize,

    /// Whether names are matched case-insensitively.
    pub case: KeyCase,
}

impl HashConfig {
    pub fn limits(&self) -> TableLimits {
        TableLimits {
            max_buckets: self.max_size,
            max_bucket_bytes: self.bucket_size,
        }
    }
}

impl Default for HashConfig {
    fn default() -> Self {
        let limits = TableLimits::default();
        Self {
            max_size: limits.max_buckets,
            bucket_size: limits.max_bucket_bytes,
            keys: KeysSize::default(),
            case: KeyCase::default(),
        }
    }
}

/// A virtual host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostConfig {
    /// Host identifier for logging/metrics.
    pub name: String,

    /// Exact names and wildcard patterns (`*.example.com`, `.example.com`,
    /// `www.example.*`).
    #[serde(default)]
    pub server_names: Vec<String>,

    /// Answer for names no pattern matches.
    #[serde(default)]
    pub default: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: IndexConfig = toml::from_str("").unwrap();
        assert_eq!(config.hash.max_size, 512);
        assert_eq!(config.hash.bucket_size, 64);
        assert_eq!(config.hash.keys, KeysSize::Small);
        assert_eq!(config.hash.case, KeyCase::Fold);
        assert_eq!(config.observability.log_level, "info");
        assert!(config.hosts.is_empty());
    }

    #[test]
    fn test_full_document() {
        let config: IndexConfig = toml::from_str(
            r#"
            [hash]
            max_size = 1024
            bucket_size = 128
            keys = "large"
            case = "preserve"

            [[hosts]]
            name = "main"
            server_names = ["example.com", "*.example.com"]

            [[hosts]]
            name = "fallback"
            default = true
            server_names = ["localhost"]
            "#,
        )
        .unwrap();

        assert_eq!(config.hash.limits().max_buckets, 1024);
        assert_eq!(config.hash.limits().max_bucket_bytes, 128);
        assert_eq!(config.hash.keys, KeysSize::Large);
        assert_eq!(config.hash.case, KeyCase::Preserve);
        assert_eq!(config.hosts.len(), 2);
        assert_eq!(config.hosts[0].server_names[1], "*.example.com");
        assert!(!config.hosts[0].default);
        assert!(config.hosts[1].default);
    }
}
