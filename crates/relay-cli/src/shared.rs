//! Shared helpers used across CLI commands.
//!
//! Turns the file configuration into runtime settings and builds the
//! orchestrator with the built-in toolkit registered.

use relay_config::{DedupScopeSetting, RelayConfig};
use relay_runtime::{
    ChainConfig, DedupEviction, DedupPolicy, DedupScope, Registry, RuntimeConfig,
    ToolOrchestrator,
};

use crate::toolkit;

/// Converts the file schema into runtime settings.
pub fn runtime_config(config: &RelayConfig) -> RuntimeConfig {
    RuntimeConfig {
        chain: ChainConfig {
            max_depth: config.chain.max_depth,
            timeout: config.chain.timeout(),
            chain_timeout: config.chain.chain_timeout(),
        },
        dedup: DedupPolicy {
            scope: match config.dedup.scope {
                DedupScopeSetting::Chain => DedupScope::Chain,
                DedupScopeSetting::Process => DedupScope::Process,
            },
            eviction: match config.dedup.ttl() {
                Some(ttl) => DedupEviction::After(ttl),
                None => DedupEviction::RetainForScope,
            },
            capacity: config.dedup.capacity,
        },
    }
}

/// Creates an orchestrator with every built-in tool registered.
///
/// # Errors
///
/// Returns an error if a tool fails to register.
pub fn build_orchestrator(config: &RelayConfig) -> anyhow::Result<ToolOrchestrator> {
    let mut registry = Registry::new();
    toolkit::register_all(&mut registry)?;
    tracing::debug!(tools = registry.len(), "toolkit registered");
    Ok(ToolOrchestrator::new(registry, runtime_config(config)))
}
