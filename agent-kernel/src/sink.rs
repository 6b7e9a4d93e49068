//! Reporting hooks for dispatched tool calls.

use std::sync::{Arc, Mutex};

use agent_adapters::traits::ToolCallRequest;
use serde_json::Value;
use tracing::{info, warn};

use crate::dispatch::DispatchOutcome;

/// Observer used to surface tool calls and their outcomes (console, logs, tests).
pub trait CallOutcomeSink: Send + Sync {
    /// Called once with every tool call the model requested, before dispatch.
    fn requested(&self, _calls: &[ToolCallRequest]) {}

    /// Records the outcome of one call. Called in received order.
    fn record(&self, outcome: &DispatchOutcome);
}

/// Sink implementation that logs to tracing.
#[derive(Debug, Default)]
pub struct TracingCallSink;

impl CallOutcomeSink for TracingCallSink {
    fn requested(&self, calls: &[ToolCallRequest]) {
        for call in calls {
            let args = Value::Object(call.arguments().clone());
            info!(
                tool = call.name(),
                args = %args,
                "model requested tool"
            );
        }
    }

    fn record(&self, outcome: &DispatchOutcome) {
        match outcome.result() {
            Ok(result) => {
                let args = Value::Object(result.arguments.clone());
                info!(
                    tool = %result.name,
                    args = %args,
                    value = %result.value,
                    "tool executed"
                );
            }
            Err(err) => warn!(
                tool = err.tool_name(),
                state = ?outcome.state(),
                error = %err,
                "tool call failed"
            ),
        }
    }
}

/// Sink used during testing to capture outcomes.
#[derive(Debug, Default)]
pub struct CollectingSink {
    requested: Mutex<Vec<ToolCallRequest>>,
    outcomes: Mutex<Vec<DispatchOutcome>>,
}

impl CollectingSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns the collected outcomes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex has been poisoned by a previous panic.
    #[must_use]
    pub fn drain(&self) -> Vec<DispatchOutcome> {
        let mut lock = self.outcomes.lock().expect("collecting sink poisoned");
        lock.drain(..).collect()
    }

    /// Returns the tool calls announced before dispatch.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex has been poisoned by a previous panic.
    #[must_use]
    pub fn requested_calls(&self) -> Vec<ToolCallRequest> {
        self.requested
            .lock()
            .expect("collecting sink poisoned")
            .clone()
    }
}

impl CallOutcomeSink for CollectingSink {
    fn requested(&self, calls: &[ToolCallRequest]) {
        self.requested
            .lock()
            .expect("collecting sink poisoned")
            .extend_from_slice(calls);
    }

    fn record(&self, outcome: &DispatchOutcome) {
        self.outcomes
            .lock()
            .expect("collecting sink poisoned")
            .push(outcome.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use agent_tools::arithmetic::Arithmetic;
    use agent_tools::registry::ToolRegistry;
    use serde_json::json;

    use crate::dispatch::{CallState, Dispatcher};

    async fn outcomes(calls: &[ToolCallRequest]) -> Vec<DispatchOutcome> {
        let tools = ToolRegistry::new();
        Arithmetic::register_all(&tools).unwrap();
        let report = Dispatcher::new(Arc::new(tools)).dispatch(calls).await;
        report.outcomes().to_vec()
    }

    fn calls() -> Vec<ToolCallRequest> {
        vec![
            ToolCallRequest::from_value("addition", json!({"a": 3, "b": 4})).unwrap(),
            ToolCallRequest::from_value("subtraction", json!({"a": 3, "b": 4})).unwrap(),
        ]
    }

    #[tokio::test]
    async fn tracing_sink_logs_requests_and_outcomes() {
        let calls = calls();
        let sink = TracingCallSink;

        sink.requested(&calls);
        for outcome in outcomes(&calls).await {
            sink.record(&outcome);
        }
    }

    #[tokio::test]
    async fn collecting_sink_keeps_order() {
        let calls = calls();
        let sink = CollectingSink::new();

        sink.requested(&calls);
        for outcome in outcomes(&calls).await {
            sink.record(&outcome);
        }

        assert_eq!(sink.requested_calls(), calls);
        let states: Vec<_> = sink.drain().iter().map(DispatchOutcome::state).collect();
        assert_eq!(states, [CallState::Executed, CallState::NotFound]);
        assert!(sink.drain().is_empty());
    }
}
