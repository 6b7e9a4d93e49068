//! Core shared types for tool-calling agents.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod name;

/// Error type and result alias shared across the SDK.
pub use error::{Error, Result};
/// Validated identifier for tools advertised to a model.
pub use name::ToolName;
