//! Tool-call dispatch loop.

use std::sync::Arc;

use agent_adapters::traits::ToolCallRequest;
use agent_tools::registry::{ToolError, ToolRegistry};
use futures::future::join_all;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Lifecycle of a single tool call.
///
/// `Pending → Resolved | NotFound → Executed | ExecutionFailed`; no call
/// re-enters `Pending`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallState {
    /// Received from the model, not yet looked up.
    Pending,
    /// Matched to a registered tool, not yet executed.
    Resolved,
    /// No tool is registered under the requested name.
    NotFound,
    /// The tool ran and produced a value.
    Executed,
    /// The tool ran and returned an error.
    ExecutionFailed,
}

impl CallState {
    /// Returns `true` for states a call never leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::NotFound | Self::Executed | Self::ExecutionFailed)
    }
}

/// Per-call dispatch failure. Never aborts the rest of the batch.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The model requested a tool that is not registered.
    #[error("tool `{name}` not found")]
    UnknownTool {
        /// Name requested by the model.
        name: String,
    },

    /// The tool was found but its invocation failed.
    #[error("tool `{name}` failed: {source}")]
    Execution {
        /// Name of the failing tool.
        name: String,
        /// Error returned by the tool.
        #[source]
        source: ToolError,
    },
}

impl DispatchError {
    /// Returns the tool name the error refers to.
    #[must_use]
    pub fn tool_name(&self) -> &str {
        match self {
            Self::UnknownTool { name } | Self::Execution { name, .. } => name,
        }
    }

    /// Terminal state the failed call ended in.
    #[must_use]
    pub const fn state(&self) -> CallState {
        match self {
            Self::UnknownTool { .. } => CallState::NotFound,
            Self::Execution { .. } => CallState::ExecutionFailed,
        }
    }
}

/// Value produced by a successfully executed tool call.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolExecutionResult {
    /// Name of the executed tool.
    pub name: String,
    /// Arguments exactly as received from the model.
    pub arguments: Map<String, Value>,
    /// Value returned by the tool.
    pub value: Value,
}

/// Outcome of dispatching one tool call.
#[derive(Clone, Debug, PartialEq)]
pub struct DispatchOutcome {
    request: ToolCallRequest,
    result: Result<ToolExecutionResult, DispatchError>,
}

impl DispatchOutcome {
    /// The request this outcome answers.
    #[must_use]
    pub fn request(&self) -> &ToolCallRequest {
        &self.request
    }

    /// The execution result or the per-call error.
    #[must_use]
    pub fn result(&self) -> Result<&ToolExecutionResult, &DispatchError> {
        self.result.as_ref()
    }

    /// Terminal state of the call.
    #[must_use]
    pub fn state(&self) -> CallState {
        match &self.result {
            Ok(_) => CallState::Executed,
            Err(err) => err.state(),
        }
    }
}

/// Ordered outcomes for one batch of tool calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispatchReport {
    outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    /// Outcomes in the order the calls were received.
    #[must_use]
    pub fn outcomes(&self) -> &[DispatchOutcome] {
        &self.outcomes
    }

    /// Successful results, in order.
    pub fn results(&self) -> impl Iterator<Item = &ToolExecutionResult> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Per-call errors, in order.
    pub fn errors(&self) -> impl Iterator<Item = &DispatchError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    /// Number of dispatched calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns `true` when no calls were dispatched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Returns `true` when every call executed successfully.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// How a batch of calls is executed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DispatchMode {
    /// One call at a time, each awaited before the next starts.
    #[default]
    Sequential,
    /// All calls polled together. Only valid for tools without shared
    /// mutable state; outcomes are still reported in received order.
    Concurrent,
}

/// Resolves tool calls against a registry and executes them.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    tools: Arc<ToolRegistry>,
    mode: DispatchMode,
}

impl Dispatcher {
    /// Creates a sequential dispatcher over the supplied registry.
    #[must_use]
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self {
            tools,
            mode: DispatchMode::Sequential,
        }
    }

    /// Sets the dispatch mode.
    #[must_use]
    pub fn with_mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the configured dispatch mode.
    #[must_use]
    pub const fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Returns the registry calls are resolved against.
    #[must_use]
    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Dispatches every call, returning one outcome per call in received order.
    ///
    /// An empty slice is a no-op. Unknown tools and failing tools are
    /// recorded in the report and do not stop later calls.
    pub async fn dispatch(&self, calls: &[ToolCallRequest]) -> DispatchReport {
        let outcomes = match self.mode {
            DispatchMode::Sequential => {
                let mut outcomes = Vec::with_capacity(calls.len());
                for call in calls {
                    outcomes.push(self.dispatch_one(call).await);
                }
                outcomes
            }
            DispatchMode::Concurrent => {
                join_all(calls.iter().map(|call| self.dispatch_one(call))).await
            }
        };

        DispatchReport { outcomes }
    }

    /// Dispatches a single call.
    pub async fn dispatch_one(&self, request: &ToolCallRequest) -> DispatchOutcome {
        let name = request.name();

        let Some(handle) = self.tools.lookup(name) else {
            warn!(tool = name, "model requested unknown tool");
            return DispatchOutcome {
                request: request.clone(),
                result: Err(DispatchError::UnknownTool {
                    name: name.to_owned(),
                }),
            };
        };

        debug!(tool = name, state = ?CallState::Resolved, "invoking tool");
        let result = handle
            .invoke(Value::Object(request.arguments().clone()))
            .await
            .map(|value| ToolExecutionResult {
                name: name.to_owned(),
                arguments: request.arguments().clone(),
                value,
            })
            .map_err(|source| {
                warn!(tool = name, error = %source, "tool execution failed");
                DispatchError::Execution {
                    name: name.to_owned(),
                    source,
                }
            });

        DispatchOutcome {
            request: request.clone(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use agent_primitives::ToolName;
    use agent_tools::arithmetic::Arithmetic;
    use agent_tools::schema::{ParameterSchema, ToolDeclaration};
    use serde_json::json;

    fn registry() -> Arc<ToolRegistry> {
        let registry = ToolRegistry::new();
        Arithmetic::register_all(&registry).unwrap();
        Arc::new(registry)
    }

    fn call(name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest::from_value(name, arguments).unwrap()
    }

    #[tokio::test]
    async fn executes_addition_and_multiplication() {
        let dispatcher = Dispatcher::new(registry());
        let report = dispatcher
            .dispatch(&[
                call("addition", json!({"a": 3, "b": 4})),
                call("multiplication", json!({"a": 7, "b": 77})),
            ])
            .await;

        let values: Vec<_> = report.results().map(|r| r.value.clone()).collect();
        assert_eq!(values, [json!(7), json!(539)]);
        assert!(report.all_succeeded());
        assert_eq!(report.outcomes()[0].state(), CallState::Executed);
        assert_eq!(report.outcomes()[1].request().name(), "multiplication");
    }

    #[tokio::test]
    async fn empty_batch_is_noop() {
        let report = Dispatcher::new(registry()).dispatch(&[]).await;
        assert!(report.is_empty());
        assert_eq!(report.results().count(), 0);
        assert_eq!(report.errors().count(), 0);
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_once() {
        let report = Dispatcher::new(registry())
            .dispatch(&[call("subtraction", json!({"a": 1, "b": 2}))])
            .await;

        let errors: Vec<_> = report.errors().collect();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], DispatchError::UnknownTool { name } if name == "subtraction"));
        assert_eq!(report.outcomes()[0].state(), CallState::NotFound);
    }

    #[tokio::test]
    async fn name_matching_is_case_sensitive() {
        let report = Dispatcher::new(registry())
            .dispatch(&[call("Addition", json!({"a": 1, "b": 2}))])
            .await;
        assert_eq!(report.outcomes()[0].state(), CallState::NotFound);
    }

    #[tokio::test]
    async fn failures_do_not_abort_the_batch() {
        let report = Dispatcher::new(registry())
            .dispatch(&[
                call("missing", json!({})),
                call("addition", json!({"a": 3})),
                call("multiplication", json!({"a": 2, "b": 5})),
            ])
            .await;

        let states: Vec<_> = report.outcomes().iter().map(DispatchOutcome::state).collect();
        assert_eq!(
            states,
            [CallState::NotFound, CallState::ExecutionFailed, CallState::Executed]
        );
        assert!(states.iter().all(|s| s.is_terminal()));

        let failure = report.outcomes()[1].result().expect_err("missing operand");
        assert!(matches!(
            failure,
            DispatchError::Execution { source: ToolError::InvalidArguments { .. }, .. }
        ));
        assert_eq!(report.results().next().unwrap().value, json!(10));
    }

    #[tokio::test]
    async fn results_echo_received_arguments() {
        let report = Dispatcher::new(registry())
            .dispatch(&[call("addition", json!({"a": 3, "b": 4}))])
            .await;
        let result = report.results().next().unwrap();
        assert_eq!(result.name, "addition");
        assert_eq!(Value::Object(result.arguments.clone()), json!({"a": 3, "b": 4}));
    }

    fn slow_registry() -> Arc<ToolRegistry> {
        let registry = ToolRegistry::new();
        let declaration = |name: &str| {
            ToolDeclaration::new(ToolName::new(name).unwrap(), name, ParameterSchema::new())
        };
        registry
            .register_tool(declaration("slow"), |_: Value| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, ToolError>(json!("slow"))
            })
            .unwrap();
        registry
            .register_tool(declaration("fast"), |_: Value| async move {
                Ok::<_, ToolError>(json!("fast"))
            })
            .unwrap();
        Arc::new(registry)
    }

    #[tokio::test]
    async fn concurrent_mode_preserves_received_order() {
        let dispatcher = Dispatcher::new(slow_registry()).with_mode(DispatchMode::Concurrent);
        let report = dispatcher
            .dispatch(&[call("slow", json!({})), call("fast", json!({}))])
            .await;

        let values: Vec<_> = report.results().map(|r| r.value.clone()).collect();
        assert_eq!(values, [json!("slow"), json!("fast")]);
    }

    #[test]
    fn only_final_states_are_terminal() {
        assert!(!CallState::Pending.is_terminal());
        assert!(!CallState::Resolved.is_terminal());
        assert!(CallState::NotFound.is_terminal());
        assert!(CallState::Executed.is_terminal());
        assert!(CallState::ExecutionFailed.is_terminal());
    }
}
