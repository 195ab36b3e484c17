//! # relay-types
//!
//! Domain types for the relay tool orchestrator.
//! This crate contains pure data types with no runtime dependencies
//! (serde for serialization, chrono for audit timestamps).

pub mod entry;
pub mod error;
pub mod event;
pub mod outcome;
pub mod tool;

// Re-exports for convenience.
pub use entry::{ExecutionEntry, ExecutionStatus};
pub use error::{DiagnosticError, ErrorKind, RelayError, ToolError};
pub use event::RelayEvent;
pub use outcome::Outcome;
pub use tool::ToolName;
