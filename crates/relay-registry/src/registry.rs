//! Process-wide tool catalog.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use relay_types::ToolName;

use crate::error::RegistryError;
use crate::policy::{authorize, AllowList, CallerPolicy};
use crate::schema::{AnyInput, InputSchema};

/// Static description of a tool: name, input contract, permitted callers.
#[derive(Clone)]
pub struct ToolRegistration {
    /// Unique key in the registry.
    pub name: ToolName,
    /// Human-readable description.
    pub description: String,
    /// Contract applied to raw arguments before the handler runs.
    pub input_schema: Arc<dyn InputSchema>,
    /// Which calling tools may invoke this one.
    pub can_invoke: Arc<dyn CallerPolicy>,
}

impl ToolRegistration {
    /// Creates a registration accepting any input, callable only at chain root.
    pub fn new(name: ToolName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            input_schema: Arc::new(AnyInput),
            can_invoke: Arc::new(AllowList::default()),
        }
    }

    /// Sets the input contract.
    pub fn with_schema(mut self, schema: impl InputSchema + 'static) -> Self {
        self.input_schema = Arc::new(schema);
        self
    }

    /// Sets the caller policy.
    pub fn with_policy(mut self, policy: Arc<dyn CallerPolicy>) -> Self {
        self.can_invoke = policy;
        self
    }

    /// Returns true if `caller` may invoke this tool (`None` = chain root).
    pub fn permits(&self, caller: Option<&ToolName>) -> bool {
        authorize(self.can_invoke.as_ref(), caller)
    }

    /// Builds the public descriptor for listings.
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.json_schema(),
            can_invoke: self.can_invoke.describe(),
        }
    }
}

impl fmt::Debug for ToolRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRegistration")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("can_invoke", &self.can_invoke)
            .finish_non_exhaustive()
    }
}

/// Serializable summary of a registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: ToolName,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    pub can_invoke: String,
}

/// A registration paired with its handler.
pub struct RegisteredTool<H: ?Sized> {
    pub registration: ToolRegistration,
    pub handler: Arc<H>,
}

/// Catalog mapping tool names to registrations and handlers.
///
/// Built once at startup, then shared behind an `Arc` for the process lifetime.
pub struct ToolRegistry<H: ?Sized> {
    tools: HashMap<ToolName, Arc<RegisteredTool<H>>>,
}

impl<H: ?Sized> ToolRegistry<H> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registers a tool.
    ///
    /// # Errors
    /// Returns `RegistryError::Duplicate` if the name is already taken.
    pub fn register(
        &mut self,
        registration: ToolRegistration,
        handler: Arc<H>,
    ) -> Result<(), RegistryError> {
        if self.tools.contains_key(&registration.name) {
            return Err(RegistryError::Duplicate {
                name: registration.name.to_string(),
            });
        }
        debug!(tool = %registration.name, "tool registered");
        let name = registration.name.clone();
        self.tools.insert(
            name,
            Arc::new(RegisteredTool {
                registration,
                handler,
            }),
        );
        Ok(())
    }

    /// Looks up a tool by name.
    ///
    /// # Errors
    /// Returns `RegistryError::NotFound` if no tool has that name.
    pub fn lookup(&self, name: &str) -> Result<Arc<RegisteredTool<H>>, RegistryError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                name: name.to_string(),
            })
    }

    /// Returns true if a tool with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Lists all tools sorted by name.
    pub fn list(&self) -> Vec<ToolDescriptor> {
        let mut out: Vec<ToolDescriptor> = self
            .tools
            .values()
            .map(|t| t.registration.descriptor())
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl<H: ?Sized> Default for ToolRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}
