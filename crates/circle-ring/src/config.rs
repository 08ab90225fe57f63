//! Ring configuration, optionally parsed from TOML.
//!
//! ```toml
//! default_replicas = 160
//! hash = "fnv1a"
//! ```
//!
//! Custom hash functions cannot be named in TOML; attach one with
//! [`RingConfig::with_hasher`].

use std::path::Path;

use serde::Deserialize;

use crate::error::RingError;
use crate::hash::{HashStrategy, RingHasher};

/// Replica count used when none is configured.
pub const DEFAULT_REPLICAS: usize = 43;

/// Construction-time settings for a [`Ring`](crate::Ring).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Replicas per member when a caller does not specify a count.
    /// Zero selects [`DEFAULT_REPLICAS`].
    pub default_replicas: usize,
    /// Hash function for positions and lookup keys.
    pub hash: HashStrategy,
}

impl RingConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, RingError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse config from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, RingError> {
        Ok(toml::from_str(s)?)
    }

    /// Set the default replica count.
    pub fn with_default_replicas(mut self, replicas: usize) -> Self {
        self.default_replicas = replicas;
        self
    }

    /// Select a built-in hash strategy.
    pub fn with_hash(mut self, hash: HashStrategy) -> Self {
        self.hash = hash;
        self
    }

    /// Hash with a caller-supplied function instead of a built-in one.
    pub fn with_hasher(self, hasher: impl RingHasher + 'static) -> Self {
        self.with_hash(HashStrategy::custom(hasher))
    }

    /// Effective default replica count (configured value or 43).
    pub fn default_replicas(&self) -> usize {
        if self.default_replicas == 0 {
            DEFAULT_REPLICAS
        } else {
            self.default_replicas
        }
    }
}
