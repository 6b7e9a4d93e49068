//! Single-prompt tool-calling agent.

use std::fmt;
use std::sync::Arc;

use agent_adapters::traits::{AdapterError, InferenceRequest, ModelAdapter, ModelResponse};
use agent_tools::registry::ToolRegistry;
use thiserror::Error;
use tracing::{debug, info};

use crate::dispatch::{DispatchMode, DispatchReport, Dispatcher};
use crate::sink::{CallOutcomeSink, TracingCallSink};

/// Failure that aborts a whole run.
///
/// Per-call dispatch failures are not errors at this level; they are
/// reported inside [`AgentRun::report`].
#[derive(Debug, Error)]
pub enum AgentError {
    /// The model could not be reached or answered with a malformed payload.
    #[error("adapter `{provider}` for model `{model}` error: {source}")]
    Model {
        /// Provider identifier of the adapter.
        provider: &'static str,
        /// Model identifier.
        model: String,
        /// Underlying adapter failure.
        #[source]
        source: AdapterError,
    },
}

/// Result of one prompt: the model response and the dispatch report.
#[derive(Debug)]
pub struct AgentRun {
    response: ModelResponse,
    report: DispatchReport,
}

impl AgentRun {
    /// The model's response, including the requested tool calls.
    #[must_use]
    pub fn response(&self) -> &ModelResponse {
        &self.response
    }

    /// Outcomes of the dispatched tool calls, in received order.
    #[must_use]
    pub fn report(&self) -> &DispatchReport {
        &self.report
    }
}

/// Binds a tool registry to a model adapter and dispatches the model's tool
/// calls for a prompt.
#[derive(Clone)]
pub struct ToolAgent {
    adapter: Arc<dyn ModelAdapter>,
    dispatcher: Dispatcher,
    sink: Arc<dyn CallOutcomeSink>,
    system_prompt: Option<String>,
    temperature: Option<f32>,
}

impl fmt::Debug for ToolAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.adapter.metadata();
        f.debug_struct("ToolAgent")
            .field("provider", &metadata.provider())
            .field("model", &metadata.model())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl ToolAgent {
    /// Creates an agent that logs outcomes through tracing.
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            adapter,
            dispatcher: Dispatcher::new(tools),
            sink: Arc::new(TracingCallSink),
            system_prompt: None,
            temperature: None,
        }
    }

    /// Replaces the outcome sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn CallOutcomeSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets how tool calls are executed.
    #[must_use]
    pub fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatcher = self.dispatcher.with_mode(mode);
        self
    }

    /// Sets a system prompt sent ahead of every user prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Pins the sampling temperature for every request.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Returns the dispatcher used for tool calls.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn build_request(&self, prompt: &str) -> Result<InferenceRequest, AgentError> {
        let mut request = InferenceRequest::from_prompt(prompt)
            .map_err(|err| self.model_error(err))?
            .with_tools(self.dispatcher.tools().declarations());

        if let Some(system) = &self.system_prompt {
            request = request.with_system_prompt(system.clone());
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        Ok(request)
    }

    fn model_error(&self, source: AdapterError) -> AgentError {
        let metadata = self.adapter.metadata();
        AgentError::Model {
            provider: metadata.provider(),
            model: metadata.model().to_owned(),
            source,
        }
    }

    /// Submits the prompt once and dispatches every tool call in the response.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Model`] when the adapter fails; no tool is
    /// executed in that case.
    pub async fn run(&self, prompt: &str) -> Result<AgentRun, AgentError> {
        let request = self.build_request(prompt)?;
        debug!(tools = request.tools().len(), "submitting prompt");

        let response = self
            .adapter
            .invoke(request)
            .await
            .map_err(|err| self.model_error(err))?;

        info!(
            tool_calls = response.tool_calls().len(),
            "model responded"
        );
        self.sink.requested(response.tool_calls());

        let report = self.dispatcher.dispatch(response.tool_calls()).await;
        for outcome in report.outcomes() {
            self.sink.record(outcome);
        }

        Ok(AgentRun { response, report })
    }
}
