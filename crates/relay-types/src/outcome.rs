//! The business result a tool handler returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result value returned by tool handlers: `{ success, data?, error? }`.
///
/// A failed `Outcome` is an ordinary business result. It is distinct from a
/// handler returning `Err(ToolError)`, which the engine treats as a thrown
/// failure eligible for recovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    /// Whether the tool reports success.
    pub success: bool,
    /// Payload produced by the tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Failure message when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Outcome {
    /// Creates a successful outcome carrying `data`.
    pub fn ok(data: impl Into<Value>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
        }
    }

    /// Creates a successful outcome without a payload.
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    /// Creates a failed outcome with the given message.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Attaches a payload to the outcome.
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_carries_data() {
        let o = Outcome::ok(json!({"text": "hi"}));
        assert!(o.success);
        assert_eq!(o.data, Some(json!({"text": "hi"})));
        assert!(o.error.is_none());
    }

    #[test]
    fn failure_carries_error() {
        let o = Outcome::failure("bad input");
        assert!(!o.success);
        assert_eq!(o.error.as_deref(), Some("bad input"));
    }

    #[test]
    fn serialization_skips_absent_fields() {
        let json = serde_json::to_string(&Outcome::empty()).expect("serialize");
        assert_eq!(json, r#"{"success":true}"#);
    }

    #[test]
    fn deserialize_minimal() {
        let o: Outcome = serde_json::from_str(r#"{"success":false}"#).expect("deserialize");
        assert!(!o.success);
        assert!(o.data.is_none());
    }
}
