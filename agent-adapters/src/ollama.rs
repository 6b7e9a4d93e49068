//! `Ollama` adapter implementation.

use std::{fmt, time::Duration};

use agent_tools::schema::ToolDeclaration;
use async_trait::async_trait;
use hyper::Uri;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::http_client::JsonTransport;
use crate::traits::{
    AdapterError, AdapterMetadata, AdapterResult, InferenceRequest, MessageRole, ModelAdapter,
    ModelResponse, PromptMessage, ToolCallRequest,
};

/// Default address of a local Ollama daemon.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/";

/// Configuration for the `Ollama` adapter.
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    base_url: String,
    model: String,
    default_temperature: Option<f32>,
    timeout: Duration,
}

impl OllamaConfig {
    /// Creates a configuration for the supplied model using default settings.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            model: model.into(),
            default_temperature: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Overrides the base URL of the Ollama daemon.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> AdapterResult<Self> {
        let sanitized = sanitize_base_url(base_url.as_ref())?;
        self.base_url = sanitized;
        Ok(self)
    }

    /// Sets the sampling temperature used when the request does not provide
    /// one explicitly.
    #[must_use]
    pub fn with_default_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = Some(temperature);
        self
    }

    /// Sets the HTTP timeout for requests to the Ollama daemon.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the sanitized base URL (always ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// `Ollama` adapter that calls the `/api/chat` endpoint over HTTP/HTTPS.
pub struct OllamaAdapter {
    transport: JsonTransport,
    endpoint: Uri,
    metadata: AdapterMetadata,
    default_temperature: Option<f32>,
}

impl fmt::Debug for OllamaAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaAdapter")
            .field("model", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OllamaAdapter {
    /// Constructs a new adapter from the supplied configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the endpoint is invalid or the
    /// model identifier is empty.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(config: OllamaConfig) -> AdapterResult<Self> {
        if config.model.trim().is_empty() {
            return Err(AdapterError::configuration("Ollama model cannot be empty"));
        }

        let endpoint = format!("{}api/chat", config.base_url)
            .parse::<Uri>()
            .map_err(|err| {
                AdapterError::configuration(format!("invalid Ollama endpoint: {err}"))
            })?;

        Ok(Self {
            transport: JsonTransport::new(config.timeout),
            endpoint,
            metadata: AdapterMetadata::new("ollama", config.model.clone()),
            default_temperature: config.default_temperature,
        })
    }

    /// Returns the chat endpoint this adapter posts to.
    #[must_use]
    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    fn build_request<'a>(&'a self, request: &'a InferenceRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(request.messages().len() + 1);
        if let Some(system) = request.system_prompt() {
            messages.push(ChatMessage {
                role: MessageRole::System.to_string(),
                content: system.to_owned(),
            });
        }
        messages.extend(request.messages().iter().map(map_prompt_message));

        let temperature = request.temperature().or(self.default_temperature);
        let options = if temperature.is_some() || request.max_output_tokens().is_some() {
            Some(ChatOptions {
                temperature,
                max_output_tokens: request.max_output_tokens(),
            })
        } else {
            None
        };

        ChatRequest {
            model: self.metadata.model(),
            stream: false,
            messages,
            options,
            tools: request.tools(),
        }
    }
}

#[async_trait]
impl ModelAdapter for OllamaAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn invoke(&self, request: InferenceRequest) -> AdapterResult<ModelResponse> {
        let payload = self.build_request(&request);
        let body = serde_json::to_vec(&payload).map_err(|err| {
            AdapterError::invalid_request(format!("failed to encode Ollama request: {err}"))
        })?;

        debug!(
            model = self.metadata.model(),
            endpoint = %self.endpoint,
            tools = request.tools().len(),
            "sending chat request"
        );

        let (status, bytes) = self.transport.post_json(&self.endpoint, body).await?;

        if !status.is_success() {
            let reason = String::from_utf8_lossy(&bytes).to_string();
            warn!(%status, "Ollama rejected chat request");
            return Err(AdapterError::protocol(format!(
                "Ollama returned {status}: {reason}"
            )));
        }

        let response: ChatResponse = serde_json::from_slice(&bytes).map_err(|err| {
            AdapterError::protocol(format!("failed to decode Ollama response: {err}"))
        })?;

        if let Some(error) = response.error {
            return Err(AdapterError::protocol(error));
        }

        let message = response
            .message
            .ok_or_else(|| AdapterError::protocol("Ollama response has no message"))?;

        let tool_calls = message
            .tool_calls
            .into_iter()
            .map(WireToolCall::into_request)
            .collect::<AdapterResult<Vec<_>>>()?;

        debug!(tool_calls = tool_calls.len(), "received chat response");
        Ok(ModelResponse::new(message.content, tool_calls))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<ChatOptions>,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDeclaration],
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "num_predict")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default, deserialize_with = "nullable_vec")]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

impl WireToolCall {
    // Ollama sends an object; OpenAI-compatible servers send a JSON string.
    fn into_request(self) -> AdapterResult<ToolCallRequest> {
        let WireFunction { name, arguments } = self.function;
        let arguments = match arguments {
            Value::String(raw) if raw.trim().is_empty() => Value::Null,
            Value::String(raw) => serde_json::from_str(&raw).map_err(|err| {
                AdapterError::protocol(format!("tool call `{name}` has undecodable arguments: {err}"))
            })?,
            other => other,
        };
        ToolCallRequest::from_value(name, arguments)
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn no_tools(tools: &&[ToolDeclaration]) -> bool {
    tools.is_empty()
}

fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn map_prompt_message(message: &PromptMessage) -> ChatMessage {
    ChatMessage {
        role: message.role().to_string(),
        content: message.content().to_owned(),
    }
}

fn sanitize_base_url(input: &str) -> AdapterResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AdapterError::configuration(
            "Ollama base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>()
        .map_err(|err| AdapterError::configuration(format!("invalid Ollama base URL: {err}")))?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_tools::arithmetic::Arithmetic;
    use serde_json::json;

    #[test]
    fn rejects_base_url_without_scheme() {
        let err = OllamaConfig::new("qwen2.5:14b")
            .with_base_url("localhost:11434")
            .expect_err("missing scheme should error");
        assert!(matches!(err, AdapterError::Configuration { .. }));
    }

    #[test]
    fn sanitize_adds_trailing_slash() {
        let cfg = OllamaConfig::new("qwen2.5:14b")
            .with_base_url("http://localhost:11434")
            .expect("valid url");
        assert_eq!(cfg.base_url(), "http://localhost:11434/");
    }

    #[test]
    fn rejects_empty_model() {
        let err = OllamaAdapter::new(OllamaConfig::new(" ")).expect_err("empty model");
        assert!(matches!(err, AdapterError::Configuration { .. }));
    }

    #[test]
    fn endpoint_targets_chat_api() {
        let adapter = OllamaAdapter::new(OllamaConfig::new("qwen2.5:14b")).unwrap();
        assert_eq!(adapter.endpoint().path(), "/api/chat");
    }

    #[test]
    fn build_request_carries_tools_and_temperature() {
        let adapter =
            OllamaAdapter::new(OllamaConfig::new("qwen2.5:14b").with_default_temperature(0.0))
                .expect("adapter");
        let request = InferenceRequest::from_prompt("Add 3 and 4")
            .unwrap()
            .with_system_prompt("Use tools for arithmetic.")
            .with_tools(
                Arithmetic::ALL
                    .iter()
                    .map(|tool| tool.declaration().unwrap())
                    .collect(),
            );

        let body = serde_json::to_value(adapter.build_request(&request)).unwrap();
        assert_eq!(body["model"], "qwen2.5:14b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.0);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Add 3 and 4");
        assert_eq!(body["tools"][0]["function"]["name"], "addition");
        assert_eq!(body["tools"][1]["function"]["name"], "multiplication");
    }

    #[test]
    fn build_request_omits_empty_sections() {
        let adapter = OllamaAdapter::new(OllamaConfig::new("qwen2.5:14b")).unwrap();
        let request = InferenceRequest::from_prompt("hello").unwrap();

        let body = serde_json::to_value(adapter.build_request(&request)).unwrap();
        assert!(body.get("options").is_none());
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn parses_tool_calls_with_object_and_string_arguments() {
        let json = r#"{
            "model": "qwen2.5:14b",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "addition", "arguments": {"a": 3, "b": 4}}},
                    {"function": {"name": "multiplication", "arguments": "{\"a\": 7, \"b\": 77}"}}
                ]
            },
            "done": true
        }"#;

        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        let calls = parsed
            .message
            .unwrap()
            .tool_calls
            .into_iter()
            .map(WireToolCall::into_request)
            .collect::<AdapterResult<Vec<_>>>()
            .unwrap();

        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name(), "addition");
        assert_eq!(calls[0].arguments()["b"], json!(4));
        assert_eq!(calls[1].arguments()["b"], json!(77));
    }

    #[test]
    fn null_tool_calls_are_empty() {
        let json = r#"{"message": {"role": "assistant", "content": "42", "tool_calls": null}}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.message.unwrap().tool_calls.is_empty());
    }

    #[test]
    fn malformed_string_arguments_are_protocol_errors() {
        let call = WireToolCall {
            function: WireFunction {
                name: "addition".to_owned(),
                arguments: Value::String("{a: 3".to_owned()),
            },
        };
        let err = call.into_request().expect_err("bad json");
        assert!(matches!(err, AdapterError::Protocol { .. }));
    }
}
