//! Input contracts: validate raw arguments or reject them.

use std::fmt;
use std::marker::PhantomData;

use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{RegistryError, SchemaError};

/// Validate-or-reject contract applied to raw arguments before a handler runs.
///
/// Returns the parsed (possibly normalized) arguments the handler receives.
pub trait InputSchema: Send + Sync {
    /// Validates `raw` and returns the arguments to hand to the handler.
    fn validate(&self, raw: &Value) -> Result<Value, SchemaError>;

    /// JSON Schema document describing the accepted input, if known.
    fn json_schema(&self) -> Option<Value> {
        None
    }
}

/// Accepts any input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyInput;

impl InputSchema for AnyInput {
    fn validate(&self, raw: &Value) -> Result<Value, SchemaError> {
        Ok(raw.clone())
    }
}

/// Validates input against a compiled JSON Schema document.
pub struct JsonSchemaInput {
    document: Value,
    compiled: JSONSchema,
}

impl JsonSchemaInput {
    /// Compiles `document` into a validator.
    ///
    /// # Errors
    /// Returns `RegistryError::InvalidSchema` if the document is not a valid schema.
    pub fn new(document: Value) -> Result<Self, RegistryError> {
        let compiled =
            JSONSchema::compile(&document).map_err(|e| RegistryError::InvalidSchema {
                message: e.to_string(),
            })?;
        Ok(Self { document, compiled })
    }
}

impl fmt::Debug for JsonSchemaInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaInput")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl InputSchema for JsonSchemaInput {
    fn validate(&self, raw: &Value) -> Result<Value, SchemaError> {
        if let Err(errors) = self.compiled.validate(raw) {
            let messages: Vec<String> = errors.map(|e| e.to_string()).collect();
            return Err(SchemaError::new(messages.join("; ")));
        }
        Ok(raw.clone())
    }

    fn json_schema(&self) -> Option<Value> {
        Some(self.document.clone())
    }
}

/// Validates input by deserializing it into `T`.
///
/// The handler receives `T` re-serialized, so serde defaults are filled in.
pub struct TypedInput<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedInput<T> {
    /// Creates a typed contract.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedInput<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypedInput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedInput<{}>", std::any::type_name::<T>())
    }
}

impl<T> InputSchema for TypedInput<T>
where
    T: DeserializeOwned + Serialize,
{
    fn validate(&self, raw: &Value) -> Result<Value, SchemaError> {
        let parsed: T =
            serde_json::from_value(raw.clone()).map_err(|e| SchemaError::new(e.to_string()))?;
        serde_json::to_value(parsed).map_err(|e| SchemaError::new(e.to_string()))
    }
}
