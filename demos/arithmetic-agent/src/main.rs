//! Arithmetic tool-calling demo.
//!
//! Registers the `addition` and `multiplication` tools, sends one prompt to a
//! local Ollama model, and prints every tool call the model requested along
//! with its result.
//!
//! # Usage
//!
//! ```bash
//! arithmetic-agent [--config agent.toml] [--model qwen2.5:14b] ["Add 3 and 4, multiply the result by 77"]
//! ```
//!
//! # Environment Variables
//!
//! - `OLLAMA_HOST`, `OLLAMA_MODEL`: override the endpoint and model
//! - `RUST_LOG`: log verbosity (default: `warn`); logs go to stderr

use std::path::PathBuf;
use std::sync::Arc;

use agent_adapters::ollama::{OllamaAdapter, OllamaConfig};
use agent_adapters::traits::ToolCallRequest;
use agent_config::AgentConfig;
use agent_kernel::{CallOutcomeSink, DispatchMode, DispatchOutcome, ToolAgent};
use agent_tools::arithmetic::Arithmetic;
use agent_tools::registry::ToolRegistry;
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Ask a local model to do arithmetic through tool calls
#[derive(Debug, Parser)]
#[command(name = "arithmetic-agent")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the Ollama daemon
    #[arg(long)]
    endpoint: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Execute tool calls concurrently
    #[arg(long)]
    concurrent: bool,

    /// Prompt sent to the model
    prompt: Option<String>,
}

impl Args {
    fn into_config(self) -> Result<AgentConfig> {
        let mut config = match &self.config {
            Some(path) => AgentConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => AgentConfig::default(),
        }
        .apply_env();

        if let Some(model) = self.model {
            config.model = model;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(prompt) = self.prompt {
            config.prompt = prompt;
        }
        config.concurrent |= self.concurrent;

        config.validate()?;
        Ok(config)
    }
}

/// Prints tool calls and outcomes to stdout.
struct ConsoleSink;

impl CallOutcomeSink for ConsoleSink {
    fn requested(&self, calls: &[ToolCallRequest]) {
        for call in calls {
            println!("{}", requested_line(call));
        }
    }

    fn record(&self, outcome: &DispatchOutcome) {
        println!("{}", outcome_line(outcome));
    }
}

fn json_args(arguments: &Map<String, Value>) -> String {
    Value::Object(arguments.clone()).to_string()
}

fn requested_line(call: &ToolCallRequest) -> String {
    format!("Tool: {} Args: {}", call.name(), json_args(call.arguments()))
}

fn outcome_line(outcome: &DispatchOutcome) -> String {
    match outcome.result() {
        Ok(result) => format!(
            "Result for: {} with: {} = {}",
            result.name,
            json_args(&result.arguments),
            result.value
        ),
        Err(err) => format!("Error: {err}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(err) = agent_telemetry::init_tracing("warn") {
        eprintln!("{err}");
    }

    let config = Args::parse().into_config()?;
    info!(model = %config.model, endpoint = %config.endpoint, "starting");

    let tools = ToolRegistry::new();
    Arithmetic::register_all(&tools)?;

    let adapter = OllamaAdapter::new(
        OllamaConfig::new(config.model.clone())
            .with_base_url(&config.endpoint)?
            .with_timeout(config.timeout()),
    )?;

    let mode = if config.concurrent {
        DispatchMode::Concurrent
    } else {
        DispatchMode::Sequential
    };
    let mut agent = ToolAgent::new(Arc::new(adapter), Arc::new(tools))
        .with_sink(Arc::new(ConsoleSink))
        .with_dispatch_mode(mode)
        .with_temperature(config.temperature);
    if let Some(system) = &config.system_prompt {
        agent = agent.with_system_prompt(system.clone());
    }

    let run = agent.run(&config.prompt).await?;

    if run.response().tool_calls().is_empty() {
        println!("No tool calls returned.");
        let content = run.response().content().trim();
        if !content.is_empty() {
            println!("{content}");
        }
    } else if !run.report().all_succeeded() {
        warn!(
            failed = run.report().errors().count(),
            "some tool calls did not execute"
        );
    }

    Ok(())
}
