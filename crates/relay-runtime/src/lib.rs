//! # relay-runtime
//!
//! Invocation engine for relay.
//! Threads a [`ChainContext`] through nested tool calls, enforcing the
//! recursion ceiling and chain deadline, and offers single, batched and
//! sequential call patterns on top of [`ToolOrchestrator::invoke`].
//!
//! Handlers implement [`ToolHandler`] and may call other tools through
//! the [`ToolContext`] they receive.

pub mod batch;
pub mod cache;
pub mod context;
pub mod digest;
pub mod error;
pub mod executor;
pub mod handler;
pub mod metrics;
pub mod options;
pub mod orchestrator;
pub mod pipeline;
pub mod runtime_config;

pub use batch::BatchRequest;
pub use cache::DedupCache;
pub use context::{ChainContext, ChainSummary, EntryDraft, ExecutionLog, SharedState};
pub use digest::{hash_input, summarize_output, MAX_SUMMARY_CHARS, TRUNCATION_MARKER};
pub use error::{ContextSnapshot, RuntimeError};
pub use handler::{handler_fn, FnHandler, Registry, ToolContext, ToolHandler};
pub use metrics::{ExecutionMetrics, MetricsSnapshot};
pub use options::{InvokeOptions, RecoveryFn};
pub use orchestrator::ToolOrchestrator;
pub use pipeline::{resolve_step_input, SequenceStep};
pub use runtime_config::{ChainConfig, DedupEviction, DedupPolicy, DedupScope, RuntimeConfig};
