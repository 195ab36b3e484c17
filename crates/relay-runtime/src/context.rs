//! Chain context: per-chain identity, depth, deadlines and shared resources.
//!
//! A chain is a root call plus every nested call it spawns. All contexts of
//! one chain share the same `SharedState` and `ExecutionLog` containers by
//! identity; a child only differs in `depth` and `parent_tool`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

use relay_types::{ExecutionEntry, ExecutionStatus, ToolName};

use crate::cache::DedupCache;
use crate::error::{ContextSnapshot, RuntimeError};
use crate::runtime_config::ChainConfig;

/// Key/value store shared by every context of a chain.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<HashMap<String, Value>>>,
}

impl SharedState {
    /// Returns a clone of the value under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.lock().insert(key.into(), value)
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().remove(key)
    }

    /// Runs `f` on the entry for `key` while holding the lock.
    ///
    /// Use this for read-modify-write updates that must not interleave
    /// with other handlers of the same chain.
    pub fn update<R>(&self, key: &str, f: impl FnOnce(&mut Option<Value>) -> R) -> R {
        let mut map = self.lock();
        let mut slot = map.remove(key);
        let out = f(&mut slot);
        if let Some(v) = slot {
            map.insert(key.to_string(), v);
        }
        out
    }

    /// Returns a copy of the whole store.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns true if both handles point at the same container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Value>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Append-only audit log shared by every context of a chain.
///
/// Entries appear in completion order.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    inner: Arc<Mutex<Vec<ExecutionEntry>>>,
}

impl ExecutionLog {
    fn append(&self, entry: ExecutionEntry) {
        self.lock().push(entry);
    }

    /// Returns a copy of all entries.
    pub fn entries(&self) -> Vec<ExecutionEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns the most recently appended entry.
    pub fn last(&self) -> Option<ExecutionEntry> {
        self.lock().last().cloned()
    }

    /// Returns true if both handles point at the same container.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ExecutionEntry>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// An execution entry before the log stamps `timestamp` and `depth`.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub tool_name: String,
    pub input_hash: String,
    pub output_summary: String,
    pub duration_ms: u64,
    pub status: ExecutionStatus,
    pub error_details: Option<String>,
}

/// Aggregate view of a chain's execution log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainSummary {
    pub correlation_id: String,
    pub total_duration_ms: u64,
    pub tool_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub skipped_count: usize,
    pub max_depth_reached: u32,
}

/// Per-call-chain context threaded through every nested invocation.
#[derive(Debug, Clone)]
pub struct ChainContext {
    correlation_id: String,
    depth: u32,
    max_depth: u32,
    timeout: Duration,
    chain_start: Instant,
    chain_timeout: Option<Duration>,
    shared_state: SharedState,
    execution_log: ExecutionLog,
    parent_tool: Option<ToolName>,
    dedup: DedupCache,
}

impl ChainContext {
    /// Creates the root context of a new chain.
    ///
    /// Generates a random v4 UUID when no correlation id is given.
    pub fn root(correlation_id: Option<String>, config: &ChainConfig) -> Self {
        Self {
            correlation_id: correlation_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            depth: 0,
            max_depth: config.max_depth,
            timeout: config.timeout,
            chain_start: Instant::now(),
            chain_timeout: config.chain_timeout,
            shared_state: SharedState::default(),
            execution_log: ExecutionLog::default(),
            parent_tool: None,
            dedup: DedupCache::new(),
        }
    }

    /// Creates a nested context for a call spawned by `caller`.
    ///
    /// # Errors
    /// Returns `RuntimeError::RecursionDepth` if this context is already at
    /// the depth ceiling.
    pub fn child(&self, caller: &ToolName) -> Result<Self, RuntimeError> {
        if self.depth >= self.max_depth {
            return Err(RuntimeError::RecursionDepth {
                attempted_depth: self.depth + 1,
                max_depth: self.max_depth,
                snapshot: self.snapshot(),
            });
        }
        Ok(Self {
            depth: self.depth + 1,
            parent_tool: Some(caller.clone()),
            ..self.clone()
        })
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Default per-call timeout for calls made in this chain.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn chain_timeout(&self) -> Option<Duration> {
        self.chain_timeout
    }

    /// Name of the tool that spawned this context (`None` at the root).
    pub fn parent_tool(&self) -> Option<&ToolName> {
        self.parent_tool.as_ref()
    }

    pub fn shared_state(&self) -> &SharedState {
        &self.shared_state
    }

    pub fn execution_log(&self) -> &ExecutionLog {
        &self.execution_log
    }

    pub(crate) fn dedup_cache(&self) -> &DedupCache {
        &self.dedup
    }

    /// Stamps `timestamp` and `depth` onto `draft` and appends it to the log.
    pub fn append_entry(&self, draft: EntryDraft) {
        self.execution_log.append(ExecutionEntry {
            tool_name: draft.tool_name,
            input_hash: draft.input_hash,
            output_summary: draft.output_summary,
            duration_ms: draft.duration_ms,
            status: draft.status,
            error_details: draft.error_details,
            timestamp: Utc::now(),
            depth: self.depth,
        });
    }

    /// Time since the chain root was created.
    pub fn elapsed(&self) -> Duration {
        self.chain_start.elapsed()
    }

    /// Returns true once the chain deadline (if any) has passed.
    pub fn has_chain_timed_out(&self) -> bool {
        self.chain_timeout
            .is_some_and(|limit| self.elapsed() >= limit)
    }

    /// Time left before the chain deadline, `None` if there is none.
    pub fn remaining_chain_time(&self) -> Option<Duration> {
        self.chain_timeout
            .map(|limit| limit.saturating_sub(self.elapsed()))
    }

    /// Aggregates the shared log.
    pub fn summarize(&self) -> ChainSummary {
        let entries = self.execution_log.lock();
        let count = |status: ExecutionStatus| entries.iter().filter(|e| e.status == status).count();
        ChainSummary {
            correlation_id: self.correlation_id.clone(),
            total_duration_ms: entries.iter().map(|e| e.duration_ms).sum(),
            tool_count: entries.len(),
            success_count: count(ExecutionStatus::Success),
            error_count: count(ExecutionStatus::Error),
            skipped_count: count(ExecutionStatus::Skipped),
            max_depth_reached: entries.iter().map(|e| e.depth).max().unwrap_or(0),
        }
    }

    /// Captures the diagnostic state carried by fatal errors.
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            correlation_id: self.correlation_id.clone(),
            depth: self.depth,
            max_depth: self.max_depth,
            parent_tool: self.parent_tool.as_ref().map(ToString::to_string),
            elapsed_ms: self.elapsed().as_millis() as u64,
            chain_timeout_ms: self.chain_timeout.map(|d| d.as_millis() as u64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn caller() -> ToolName {
        ToolName::new("planner").unwrap()
    }

    #[test]
    fn root_generates_unique_ids() {
        let cfg = ChainConfig::default();
        let a = ChainContext::root(None, &cfg);
        let b = ChainContext::root(None, &cfg);
        assert_ne!(a.correlation_id(), b.correlation_id());
        assert_eq!(a.depth(), 0);
        assert!(a.parent_tool().is_none());
    }

    #[test]
    fn child_inherits_chain() {
        let root = ChainContext::root(Some("c-7".into()), &ChainConfig::default());
        let child = root.child(&caller()).unwrap();
        assert_eq!(child.depth(), 1);
        assert_eq!(child.correlation_id(), "c-7");
        assert_eq!(child.parent_tool().map(|t| t.as_str()), Some("planner"));
        assert!(child.shared_state().ptr_eq(root.shared_state()));
        assert!(child.execution_log().ptr_eq(root.execution_log()));
    }

    #[test]
    fn update_runs_under_lock() {
        let state = SharedState::default();
        state.insert("n", json!(1));
        let next = state.update("n", |slot| {
            let n = slot.as_ref().and_then(Value::as_i64).unwrap_or(0) + 1;
            *slot = Some(json!(n));
            n
        });
        assert_eq!(next, 2);
        assert_eq!(state.get("n"), Some(json!(2)));
        state.update("gone", |slot| *slot = None);
        assert!(state.get("gone").is_none());
    }

    #[test]
    fn append_stamps_depth() {
        let root = ChainContext::root(None, &ChainConfig::default());
        let child = root.child(&caller()).unwrap();
        child.append_entry(EntryDraft {
            tool_name: "x".into(),
            input_hash: "h".into(),
            output_summary: "ok".into(),
            duration_ms: 1,
            status: ExecutionStatus::Success,
            error_details: None,
        });
        assert_eq!(root.execution_log().last().map(|e| e.depth), Some(1));
    }
}
