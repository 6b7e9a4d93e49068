use std::sync::Arc;

use agent_adapters::ollama::{OllamaAdapter, OllamaConfig};
use agent_adapters::traits::{
    AdapterMetadata, AdapterResult, InferenceRequest, ModelAdapter, ModelResponse, ToolCallRequest,
};
use agent_kernel::{CallState, CollectingSink, DispatchMode, ToolAgent};
use agent_tools::arithmetic::Arithmetic;
use agent_tools::registry::ToolRegistry;
use async_trait::async_trait;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROMPT: &str = "Add 3 and 4, multiply the result by 77";

struct ScriptedAdapter {
    metadata: AdapterMetadata,
    response: ModelResponse,
}

#[async_trait]
impl ModelAdapter for ScriptedAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn invoke(&self, _request: InferenceRequest) -> AdapterResult<ModelResponse> {
        Ok(self.response.clone())
    }
}

fn registry() -> Arc<ToolRegistry> {
    let registry = ToolRegistry::new();
    Arithmetic::register_all(&registry).expect("register arithmetic tools");
    Arc::new(registry)
}

fn scripted(calls: Vec<ToolCallRequest>) -> Arc<ScriptedAdapter> {
    Arc::new(ScriptedAdapter {
        metadata: AdapterMetadata::new("scripted", "qwen2.5:14b"),
        response: ModelResponse::new("", calls),
    })
}

fn values(agent_run: &agent_kernel::AgentRun) -> Vec<Value> {
    agent_run
        .report()
        .results()
        .map(|result| result.value.clone())
        .collect()
}

#[tokio::test]
async fn stubbed_model_add_then_multiply() {
    let adapter = scripted(vec![
        ToolCallRequest::from_value("addition", json!({"a": 3, "b": 4})).unwrap(),
        ToolCallRequest::from_value("multiplication", json!({"a": 7, "b": 77})).unwrap(),
    ]);

    for mode in [DispatchMode::Sequential, DispatchMode::Concurrent] {
        let sink = CollectingSink::new();
        let agent = ToolAgent::new(adapter.clone(), registry())
            .with_dispatch_mode(mode)
            .with_sink(sink.clone());

        let run = agent.run(PROMPT).await.expect("run");
        assert_eq!(values(&run), [json!(7), json!(539)]);

        let recorded: Vec<_> = sink
            .drain()
            .iter()
            .map(|o| o.request().name().to_owned())
            .collect();
        assert_eq!(recorded, ["addition", "multiplication"]);
    }
}

#[tokio::test]
async fn direct_answer_dispatches_nothing() {
    let sink = CollectingSink::new();
    let agent = ToolAgent::new(scripted(Vec::new()), registry()).with_sink(sink.clone());

    let run = agent.run(PROMPT).await.expect("run");
    assert!(run.report().is_empty());
    assert!(sink.drain().is_empty());
    assert!(sink.requested_calls().is_empty());
}

#[tokio::test]
async fn unknown_tool_is_isolated() {
    let adapter = scripted(vec![
        ToolCallRequest::from_value("exponentiation", json!({"a": 2, "b": 8})).unwrap(),
        ToolCallRequest::from_value("addition", json!({"a": 3, "b": 4})).unwrap(),
    ]);
    let agent = ToolAgent::new(adapter, registry());

    let run = agent.run(PROMPT).await.expect("run");
    assert_eq!(run.report().errors().count(), 1);
    assert_eq!(run.report().outcomes()[0].state(), CallState::NotFound);
    assert_eq!(values(&run), [json!(7)]);
}

#[tokio::test]
async fn ollama_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "qwen2.5:14b",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "addition", "arguments": {"a": 3, "b": 4}}},
                    {"function": {"name": "multiplication", "arguments": {"a": 7, "b": 77}}}
                ]
            },
            "done": true
        })))
        .mount(&server)
        .await;

    let config = OllamaConfig::new("qwen2.5:14b")
        .with_base_url(server.uri())
        .expect("base url")
        .with_default_temperature(0.0);
    let adapter = Arc::new(OllamaAdapter::new(config).expect("adapter"));
    let agent = ToolAgent::new(adapter, registry());

    let run = agent.run(PROMPT).await.expect("run");
    assert_eq!(run.response().tool_calls().len(), 2);
    assert_eq!(values(&run), [json!(7), json!(539)]);
}
