//! CLI command definitions.

pub mod batch;
pub mod invoke;
pub mod sequence;
pub mod tools;
