//! # relay-registry
//!
//! The tool catalog: maps each unique tool name to its input contract,
//! its caller policy, and its handler.
//!
//! The registry is generic over the handler type so the runtime crate
//! can plug in its own async handler trait object.

pub mod error;
pub mod policy;
pub mod registry;
pub mod schema;

pub use error::{RegistryError, SchemaError};
pub use policy::{authorize, policy_from_list, AllowList, AnyCaller, CallerPolicy, WILDCARD};
pub use registry::{RegisteredTool, ToolDescriptor, ToolRegistration, ToolRegistry};
pub use schema::{AnyInput, InputSchema, JsonSchemaInput, TypedInput};
