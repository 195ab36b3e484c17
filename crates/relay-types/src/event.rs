//! Domain events for observability.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::entry::ExecutionStatus;

/// Domain events emitted while invocations move through the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// A call passed the chain guards and is about to run.
    InvocationStarted {
        tool: String,
        correlation_id: Option<String>,
        depth: u32,
        timestamp: SystemTime,
    },
    /// A call settled (successfully or not).
    InvocationCompleted {
        tool: String,
        correlation_id: Option<String>,
        status: ExecutionStatus,
        duration_ms: u64,
        timestamp: SystemTime,
    },
    /// A call was rejected by a fatal chain guard.
    InvocationRejected {
        tool: String,
        correlation_id: Option<String>,
        reason: String,
        timestamp: SystemTime,
    },
}

impl RelayEvent {
    /// Creates an invocation-started event.
    pub fn started(tool: impl Into<String>, correlation_id: Option<String>, depth: u32) -> Self {
        Self::InvocationStarted {
            tool: tool.into(),
            correlation_id,
            depth,
            timestamp: SystemTime::now(),
        }
    }

    /// Creates an invocation-completed event.
    pub fn completed(
        tool: impl Into<String>,
        correlation_id: Option<String>,
        status: ExecutionStatus,
        duration_ms: u64,
    ) -> Self {
        Self::InvocationCompleted {
            tool: tool.into(),
            correlation_id,
            status,
            duration_ms,
            timestamp: SystemTime::now(),
        }
    }

    /// Creates an invocation-rejected event.
    pub fn rejected(
        tool: impl Into<String>,
        correlation_id: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvocationRejected {
            tool: tool.into(),
            correlation_id,
            reason: reason.into(),
            timestamp: SystemTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_creation() {
        let event = RelayEvent::started("mermaid_render", Some("c-1".into()), 2);
        match &event {
            RelayEvent::InvocationStarted { tool, depth, .. } => {
                assert_eq!(tool.as_str(), "mermaid_render");
                assert_eq!(*depth, 2);
            }
            _ => panic!("unexpected event variant"),
        }
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = RelayEvent::rejected("x", None, "depth");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"invocation_rejected\""));
    }
}
