//! Configuration for the relay runtime.

use std::time::Duration;

/// Defaults applied to every chain created from this configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// No call may execute at `depth >= max_depth`.
    pub max_depth: u32,
    /// Per-call budget when a call does not set its own.
    pub timeout: Duration,
    /// Budget for the whole chain; `None` disables the chain deadline.
    pub chain_timeout: Option<Duration>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            timeout: Duration::from_secs(30),
            chain_timeout: Some(Duration::from_secs(120)),
        }
    }
}

/// Where deduplicated results are shared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DedupScope {
    /// Shared by every context of one chain; dropped with the chain.
    #[default]
    Chain,
    /// Shared by every call made through the orchestrator.
    Process,
}

/// How long a completed deduplicated result is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DedupEviction {
    /// Kept until its scope ends (or capacity pushes it out).
    #[default]
    RetainForScope,
    /// Dropped once this long has passed since the result settled.
    After(Duration),
}

/// Deduplication cache policy. Scope and eviction are always explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupPolicy {
    pub scope: DedupScope,
    pub eviction: DedupEviction,
    /// Upper bound on completed entries per cache (in-flight calls are never evicted).
    pub capacity: usize,
}

impl DedupPolicy {
    /// Returns the time-to-live, if eviction is time-bounded.
    pub fn ttl(&self) -> Option<Duration> {
        match self.eviction {
            DedupEviction::RetainForScope => None,
            DedupEviction::After(ttl) => Some(ttl),
        }
    }
}

impl Default for DedupPolicy {
    fn default() -> Self {
        Self {
            scope: DedupScope::Chain,
            eviction: DedupEviction::RetainForScope,
            capacity: 256,
        }
    }
}

/// Configuration for the relay runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Chain defaults (depth ceiling, timeouts).
    pub chain: ChainConfig,
    /// Deduplication policy.
    pub dedup: DedupPolicy,
}
