//! Configuration schema types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level relay configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Chain defaults.
    #[serde(default)]
    pub chain: ChainSection,
    /// Deduplication policy.
    #[serde(default)]
    pub dedup: DedupSection,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl RelayConfig {
    /// Checks cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.chain.max_depth == 0 {
            return Err("chain.max_depth must be at least 1".into());
        }
        if self.chain.timeout_ms == 0 {
            return Err("chain.timeout_ms must be greater than 0".into());
        }
        if self.dedup.capacity == 0 {
            return Err("dedup.capacity must be at least 1".into());
        }
        Ok(())
    }
}

/// `[chain]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSection {
    /// Depth ceiling for nested calls.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    /// Default per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Whole-chain deadline in milliseconds; 0 disables it.
    #[serde(default = "default_chain_timeout_ms")]
    pub chain_timeout_ms: u64,
}

impl ChainSection {
    /// Returns the per-call timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the chain deadline, `None` when disabled.
    pub fn chain_timeout(&self) -> Option<Duration> {
        (self.chain_timeout_ms > 0).then(|| Duration::from_millis(self.chain_timeout_ms))
    }
}

impl Default for ChainSection {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            timeout_ms: default_timeout_ms(),
            chain_timeout_ms: default_chain_timeout_ms(),
        }
    }
}

fn default_max_depth() -> u32 {
    5
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_chain_timeout_ms() -> u64 {
    120_000
}

/// Where deduplicated results are shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupScopeSetting {
    #[default]
    Chain,
    Process,
}

/// `[dedup]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupSection {
    #[serde(default)]
    pub scope: DedupScopeSetting,
    /// Age after which settled results are dropped; 0 keeps them for the
    /// lifetime of the scope.
    #[serde(default)]
    pub ttl_ms: u64,
    /// Maximum settled results per cache.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl DedupSection {
    /// Returns the time-to-live, `None` when results are kept for the scope.
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_ms > 0).then(|| Duration::from_millis(self.ttl_ms))
    }
}

impl Default for DedupSection {
    fn default() -> Self {
        Self {
            scope: DedupScopeSetting::default(),
            ttl_ms: 0,
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    256
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level filter (e.g. "info", "debug", "relay_runtime=trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
