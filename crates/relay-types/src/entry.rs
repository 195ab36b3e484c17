//! Audit records appended to a chain's execution log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final status of one recorded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// The handler ran and reported success.
    Success,
    /// The call failed (handler failure, rejection, or timeout).
    Error,
    /// The call was short-circuited onto another identical call's result.
    Skipped,
}

/// One audit record: a completed call within a chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEntry {
    /// Name of the tool that was called.
    pub tool_name: String,
    /// Digest of the call's arguments.
    pub input_hash: String,
    /// Truncated, human-readable rendering of the result or error.
    pub output_summary: String,
    /// Time spent waiting on the handler.
    pub duration_ms: u64,
    /// Final status of the call.
    pub status: ExecutionStatus,
    /// Failure detail, set when `status` is `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    /// Assigned when the entry is appended to the log.
    pub timestamp: DateTime<Utc>,
    /// Depth of the context the call ran in.
    pub depth: u32,
}
