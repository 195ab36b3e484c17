//! Registry-specific error types.

use relay_types::{DiagnosticError, ErrorKind, RelayError};
use thiserror::Error;

/// Errors returned by the tool registry.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The requested tool was not found.
    #[error("tool not found: {name}")]
    NotFound { name: String },
    /// A tool with the same name is already registered.
    #[error("tool already registered: {name}")]
    Duplicate { name: String },
    /// A JSON schema could not be compiled.
    #[error("invalid input schema: {message}")]
    InvalidSchema { message: String },
}

/// Arguments rejected by a tool's input contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SchemaError {
    /// Human-readable list of violations.
    pub message: String,
}

impl SchemaError {
    /// Creates a new schema error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<RegistryError> for RelayError {
    fn from(e: RegistryError) -> Self {
        let kind = match &e {
            RegistryError::NotFound { .. } => ErrorKind::NotFound,
            RegistryError::Duplicate { .. } => ErrorKind::Internal,
            RegistryError::InvalidSchema { .. } => ErrorKind::InvalidInput,
        };
        RelayError::new(kind, e.to_string())
    }
}

impl DiagnosticError for RegistryError {
    fn hint(&self) -> Option<String> {
        match self {
            Self::NotFound { name } => Some(format!("No tool named '{name}' is registered.")),
            Self::Duplicate { name } => Some(format!(
                "Two registrations use the name '{name}'; tool names must be unique."
            )),
            Self::InvalidSchema { .. } => {
                Some("The tool's input schema is not a valid JSON Schema document.".into())
            }
        }
    }

    fn fix(&self) -> Option<String> {
        match self {
            Self::NotFound { .. } => Some("List the available tools: relay tools".into()),
            Self::Duplicate { .. } => Some("Rename one of the tools before registering it.".into()),
            Self::InvalidSchema { .. } => None,
        }
    }
}
