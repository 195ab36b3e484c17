//! Runtime error taxonomy.
//!
//! Two variants are fatal to the whole chain (`RecursionDepth`,
//! `ChainTimeout`): they always reject the call and bypass recovery.
//! Everything else is a business-level failure that `on_error` may recover.

use relay_types::{DiagnosticError, ErrorKind, RelayError, ToolError};
use serde::Serialize;
use thiserror::Error;

/// State of a chain context at the moment a fatal guard tripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextSnapshot {
    pub correlation_id: String,
    pub depth: u32,
    pub max_depth: u32,
    pub parent_tool: Option<String>,
    pub elapsed_ms: u64,
    pub chain_timeout_ms: Option<u64>,
}

/// Errors from the invocation engine.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// The chain's depth ceiling was reached.
    #[error("recursion depth exceeded: depth {attempted_depth} reaches max depth {max_depth}")]
    RecursionDepth {
        attempted_depth: u32,
        max_depth: u32,
        snapshot: ContextSnapshot,
    },
    /// The chain-wide deadline elapsed.
    #[error("chain timed out: {elapsed_ms}ms elapsed of {chain_timeout_ms}ms")]
    ChainTimeout {
        elapsed_ms: u64,
        chain_timeout_ms: u64,
        snapshot: ContextSnapshot,
    },
    /// No tool with this name is registered.
    #[error("tool not found: {name}")]
    ToolNotFound { name: String },
    /// Arguments failed the tool's input contract.
    #[error("invalid input for '{tool}': {message}")]
    Validation { tool: String, message: String },
    /// The calling tool is not in the target's capability list.
    #[error("'{caller}' is not permitted to invoke '{tool}'")]
    Unauthorized { tool: String, caller: String },
    /// The handler did not settle before the effective timeout.
    #[error("tool '{tool}' timed out after {timeout_ms}ms")]
    Timeout { tool: String, timeout_ms: u64 },
    /// The handler raised an error (or panicked).
    #[error("tool '{tool}' failed: {message}")]
    Handler { tool: String, message: String },
    /// The recovery handler itself raised an error.
    #[error("recovery for '{tool}' failed: {message}")]
    Recovery { tool: String, message: String },
}

impl RuntimeError {
    /// Returns true for chain-aborting errors that are never recovered locally.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RecursionDepth { .. } | Self::ChainTimeout { .. })
    }

    /// Returns the chain snapshot carried by fatal errors.
    pub fn snapshot(&self) -> Option<&ContextSnapshot> {
        match self {
            Self::RecursionDepth { snapshot, .. } | Self::ChainTimeout { snapshot, .. } => {
                Some(snapshot)
            }
            _ => None,
        }
    }
}

impl From<RuntimeError> for RelayError {
    fn from(e: RuntimeError) -> Self {
        let kind = match &e {
            RuntimeError::RecursionDepth { .. } => ErrorKind::ResourceExhausted,
            RuntimeError::ChainTimeout { .. } | RuntimeError::Timeout { .. } => ErrorKind::Timeout,
            RuntimeError::ToolNotFound { .. } => ErrorKind::NotFound,
            RuntimeError::Validation { .. } => ErrorKind::InvalidInput,
            RuntimeError::Unauthorized { .. } => ErrorKind::PermissionDenied,
            RuntimeError::Handler { .. } | RuntimeError::Recovery { .. } => ErrorKind::Internal,
        };
        let context = e
            .snapshot()
            .map(|s| format!("correlation_id: {}", s.correlation_id));
        let err = RelayError::new(kind, e.to_string());
        match context {
            Some(ctx) => err.with_context(ctx),
            None => err,
        }
    }
}

/// Lets handlers propagate nested-call failures with `?`.
///
/// Fatal errors raised this way are also escalated by the engine past the
/// calling tool's recovery handler.
impl From<RuntimeError> for ToolError {
    fn from(e: RuntimeError) -> Self {
        ToolError::new(e.to_string())
    }
}

impl DiagnosticError for RuntimeError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::RecursionDepth { max_depth, .. } => Some(format!(
                "Nested tool calls went {max_depth} levels deep, which is the configured ceiling."
            )),
            Self::ChainTimeout { .. } => Some(
                "The call chain as a whole ran past its deadline; no further calls may start."
                    .into(),
            ),
            Self::ToolNotFound { name } => Some(format!("No tool named '{name}' is registered.")),
            Self::Validation { .. } => {
                Some("The arguments do not match the tool's input schema.".into())
            }
            Self::Unauthorized { tool, caller } => Some(format!(
                "'{tool}' does not list '{caller}' among the tools allowed to call it."
            )),
            Self::Timeout { timeout_ms, .. } => {
                Some(format!("The handler did not finish within {timeout_ms}ms."))
            }
            Self::Handler { .. } | Self::Recovery { .. } => None,
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::RecursionDepth { .. } => Some(
                "Raise the ceiling in relay.toml:\n  [chain]\n  max_depth = 8".into(),
            ),
            Self::ChainTimeout { .. } => Some(
                "Raise or disable the chain deadline in relay.toml:\n  [chain]\n  chain_timeout_ms = 0"
                    .into(),
            ),
            Self::ToolNotFound { .. } => Some("List the available tools: relay tools".into()),
            Self::Unauthorized { tool, caller } => Some(format!(
                "Add '{caller}' to the can_invoke list of '{tool}'."
            )),
            Self::Timeout { .. } => Some(
                "Pass a larger per-call timeout, or raise it in relay.toml:\n  [chain]\n  timeout_ms = 60000"
                    .into(),
            ),
            Self::Validation { .. } | Self::Handler { .. } | Self::Recovery { .. } => None,
        }
    }
}
