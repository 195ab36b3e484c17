//! Tool identity.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::error::RelayError;

/// Unique name of a registered tool.
/// Example: `prompt.generate` or `mermaid_render`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolName(String);

impl ToolName {
    /// Creates a new `ToolName`, validating the format.
    pub fn new(name: impl Into<String>) -> Result<Self, RelayError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RelayError::invalid_input("tool name cannot be empty"));
        }
        if name.chars().any(char::is_whitespace) {
            return Err(RelayError::invalid_input(format!(
                "tool name cannot contain whitespace: '{name}'"
            )));
        }
        // "*" is reserved as the any-caller wildcard in capability lists.
        if name == "*" {
            return Err(RelayError::invalid_input("'*' is reserved and cannot name a tool"));
        }
        Ok(Self(name))
    }

    /// Returns the tool name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ToolName {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ToolName {
    type Error = RelayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ToolName> for String {
    fn from(name: ToolName) -> Self {
        name.0
    }
}

impl AsRef<str> for ToolName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ToolName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
