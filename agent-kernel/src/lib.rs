//! Tool-call dispatch loop and single-prompt agent.
//!
//! A [`ToolAgent`] sends one prompt to a [`ModelAdapter`](agent_adapters::traits::ModelAdapter)
//! together with the declarations of a [`ToolRegistry`](agent_tools::registry::ToolRegistry),
//! then hands the returned tool calls to a [`Dispatcher`]. Model failures abort
//! the run; per-call failures are recorded in the [`DispatchReport`].

#![warn(missing_docs, clippy::pedantic)]

mod agent;
mod dispatch;
mod sink;

pub use agent::{AgentError, AgentRun, ToolAgent};
pub use dispatch::{
    CallState, DispatchError, DispatchMode, DispatchOutcome, DispatchReport, Dispatcher,
    ToolExecutionResult,
};
pub use sink::{CallOutcomeSink, CollectingSink, TracingCallSink};
