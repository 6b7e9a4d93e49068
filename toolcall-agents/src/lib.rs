//! Tool-calling agent SDK facade.
//!
//! Bundles the runtime crates behind feature flags so downstream users can
//! enable only the components they need.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use toolcall_agents::adapters::ollama::{OllamaAdapter, OllamaConfig};
//! use toolcall_agents::kernel::ToolAgent;
//! use toolcall_agents::tools::{arithmetic::Arithmetic, registry::ToolRegistry};
//!
//! let tools = ToolRegistry::new();
//! Arithmetic::register_all(&tools)?;
//!
//! let adapter = OllamaAdapter::new(OllamaConfig::new("qwen2.5:14b"))?;
//! let agent = ToolAgent::new(Arc::new(adapter), Arc::new(tools)).with_temperature(0.0);
//!
//! let run = agent.run("Add 3 and 4, multiply the result by 77").await?;
//! for result in run.report().results() {
//!     println!("{} = {}", result.name, result.value);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use agent_primitives as primitives;

/// Dispatch loop and agent orchestration (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use agent_kernel as kernel;

/// Model adapters (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use agent_adapters as adapters;

/// Tool declarations, registry, and built-in tools (enabled by `tools` feature).
#[cfg(feature = "tools")]
pub use agent_tools as tools;

/// Tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use agent_telemetry as telemetry;

/// Configuration loading (enabled by `config` feature).
#[cfg(feature = "config")]
pub use agent_config as config;
