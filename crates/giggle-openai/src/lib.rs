// SPDX-FileCopyrightText: 2026 Giggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI Responses API completion adapter for Giggle.
//!
//! Implements the two-round humor exchange: [`negotiate`] declares the
//! `is_funny` function tool and lets the model decide whether to call it;
//! [`finalize`] replays the call with its resolved output and asks for the
//! reply, threading the previous turn's response id.
//!
//! [`negotiate`]: CompletionAdapter::negotiate
//! [`finalize`]: CompletionAdapter::finalize

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use giggle_config::GiggleConfig;
use giggle_core::{
    AdapterType, Completion, CompletionAdapter, FALLBACK_REPLY, FinalizeRequest, GiggleError,
    HUMOR_TOOL_NAME, HealthStatus, NegotiateRequest, Negotiation, PluginAdapter, ToolInvocation,
};
use serde_json::json;
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{
    FunctionTool, InputItem, OutputContent, OutputItem, ResponsesRequest, ResponsesResponse,
    ToolChoice,
};

/// Completion adapter backed by the OpenAI Responses API.
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var -> error.
pub struct OpenAiCompletion {
    client: OpenAiClient,
    model: String,
    instructions: String,
    max_output_tokens: Option<u32>,
}

impl OpenAiCompletion {
    /// Creates the adapter from configuration.
    ///
    /// Instructions come from `agent.system_prompt_file`, then
    /// `agent.system_prompt`, then a built-in default.
    pub async fn new(config: &GiggleConfig) -> Result<Self, GiggleError> {
        let api_key = resolve_api_key(&config.openai.api_key)?;
        let instructions = load_system_prompt(
            &config.agent.name,
            &config.agent.system_prompt,
            &config.agent.system_prompt_file,
        )
        .await;
        let client = OpenAiClient::new(
            &api_key,
            &config.openai.base_url,
            Duration::from_secs(config.openai.request_timeout_secs),
        )?;

        info!(model = %config.openai.model, "OpenAI completion adapter initialized");

        Ok(Self::with_client(
            client,
            config.openai.model.clone(),
            instructions,
            config.openai.max_output_tokens,
        ))
    }

    /// Creates an adapter around an existing client.
    pub fn with_client(
        client: OpenAiClient,
        model: String,
        instructions: String,
        max_output_tokens: Option<u32>,
    ) -> Self {
        Self {
            client,
            model,
            instructions,
            max_output_tokens,
        }
    }

    fn request(
        &self,
        input: Vec<InputItem>,
        tool_choice: ToolChoice,
        previous_response_id: Option<String>,
    ) -> ResponsesRequest {
        ResponsesRequest {
            model: self.model.clone(),
            instructions: self.instructions.clone(),
            input,
            tools: vec![humor_tool()],
            tool_choice,
            previous_response_id,
            max_output_tokens: self.max_output_tokens,
            store: true,
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiCompletion {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Completion
    }

    async fn health_check(&self) -> Result<HealthStatus, GiggleError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GiggleError> {
        Ok(())
    }
}

#[async_trait]
impl CompletionAdapter for OpenAiCompletion {
    async fn negotiate(&self, request: NegotiateRequest) -> Result<Negotiation, GiggleError> {
        let body = self.request(vec![InputItem::user(request.text)], ToolChoice::Auto, None);
        let response = self.client.create_response(&body).await?;
        let tool_invocation = first_function_call(&response);
        debug!(
            response_id = %response.id,
            tool_called = tool_invocation.is_some(),
            "negotiation round complete"
        );
        Ok(Negotiation {
            tool_invocation,
            response_id: response.id,
        })
    }

    async fn finalize(&self, request: FinalizeRequest) -> Result<Completion, GiggleError> {
        let mut input = vec![InputItem::user(request.text)];
        if let Some(tool) = request.tool {
            input.push(InputItem::FunctionCall {
                call_id: tool.invocation.call_id.clone(),
                name: tool.invocation.name,
                arguments: tool.invocation.arguments,
            });
            input.push(InputItem::FunctionCallOutput {
                call_id: tool.invocation.call_id,
                output: json!(tool.outcome).to_string(),
            });
        }

        let body = self.request(input, ToolChoice::None, request.continuity_token);
        let response = self.client.create_response(&body).await?;
        let reply_text = first_output_text(&response)
            .unwrap_or(FALLBACK_REPLY)
            .to_string();
        debug!(response_id = %response.id, "final round complete");
        Ok(Completion {
            reply_text,
            continuity_token: response.id,
        })
    }
}

/// The single declared tool: a strict boolean humor classifier.
pub fn humor_tool() -> FunctionTool {
    FunctionTool {
        kind: "function".to_string(),
        name: HUMOR_TOOL_NAME.to_string(),
        description: "Report whether the user's latest message is a joke or meant to be funny."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "is_funny": {
                    "type": "boolean",
                    "description": "true if the message is humorous"
                }
            },
            "required": ["is_funny"],
            "additionalProperties": false
        }),
        strict: true,
    }
}

fn first_function_call(response: &ResponsesResponse) -> Option<ToolInvocation> {
    response.output.iter().find_map(|item| match item {
        OutputItem::FunctionCall {
            call_id,
            name,
            arguments,
        } => Some(ToolInvocation {
            call_id: call_id.clone(),
            name: name.clone(),
            arguments: arguments.clone(),
        }),
        _ => None,
    })
}

fn first_output_text(response: &ResponsesResponse) -> Option<&str> {
    response
        .output
        .iter()
        .filter_map(|item| match item {
            OutputItem::Message { content } => Some(content),
            _ => None,
        })
        .flatten()
        .find_map(|block| match block {
            OutputContent::OutputText { text } if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        })
}

/// Resolves the API key from config or environment.
fn resolve_api_key(config_key: &Option<String>) -> Result<String, GiggleError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("OPENAI_API_KEY").map_err(|_| {
        GiggleError::Config(
            "OpenAI API key not found. Set openai.api_key in config or OPENAI_API_KEY environment variable.".into(),
        )
    })
}

/// Loads the system prompt following priority: file > inline > default.
async fn load_system_prompt(
    agent_name: &str,
    inline_prompt: &Option<String>,
    prompt_file: &Option<String>,
) -> String {
    if let Some(file_path) = prompt_file {
        match tokio::fs::read_to_string(file_path).await {
            Ok(content) if !content.trim().is_empty() => {
                info!(path = %file_path, "loaded system prompt from file");
                return content.trim().to_string();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    path = %file_path,
                    error = %e,
                    "failed to read system prompt file, falling back"
                );
            }
        }
    }

    if let Some(prompt) = inline_prompt
        && !prompt.is_empty()
    {
        return prompt.clone();
    }

    format!(
        "You are {agent_name}, a friendly chat companion. First call the {HUMOR_TOOL_NAME} tool \
         to report whether the user's message is meant to be funny, then reply briefly in the \
         user's language."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use giggle_core::ResolvedTool;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer) -> OpenAiCompletion {
        let client = OpenAiClient::new("sk-test", &server.uri(), Duration::from_secs(5)).unwrap();
        OpenAiCompletion::with_client(client, "gpt-test".into(), "be funny".into(), None)
    }

    fn function_call_response() -> serde_json::Value {
        json!({
            "id": "resp_r1",
            "output": [{
                "type": "function_call",
                "id": "fc_1",
                "call_id": "call_abc",
                "name": "is_funny",
                "arguments": "{\"is_funny\":true}",
                "status": "completed"
            }]
        })
    }

    #[test]
    fn api_key_prefers_config() {
        assert_eq!(resolve_api_key(&Some("sk-cfg".into())).unwrap(), "sk-cfg");
    }

    #[test]
    fn empty_config_key_falls_back_to_env() {
        match resolve_api_key(&Some(String::new())) {
            Ok(key) => assert!(!key.is_empty()),
            Err(e) => assert!(e.to_string().contains("OPENAI_API_KEY")),
        }
    }

    #[tokio::test]
    async fn system_prompt_precedence() {
        let default = load_system_prompt("giggle", &None, &None).await;
        assert!(default.starts_with("You are giggle"));
        assert!(default.contains(HUMOR_TOOL_NAME));

        let inline = load_system_prompt("giggle", &Some("inline".into()), &None).await;
        assert_eq!(inline, "inline");

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prompt.md");
        std::fs::write(&file, "  from file \n").unwrap();
        let from_file = load_system_prompt(
            "giggle",
            &Some("inline".into()),
            &Some(file.to_string_lossy().into_owned()),
        )
        .await;
        assert_eq!(from_file, "from file");

        let missing = load_system_prompt(
            "giggle",
            &Some("inline".into()),
            &Some("/nonexistent/prompt.md".into()),
        )
        .await;
        assert_eq!(missing, "inline");
    }

    #[test]
    fn humor_tool_schema_is_strict() {
        let tool = serde_json::to_value(humor_tool()).unwrap();
        assert_eq!(tool["type"], "function");
        assert_eq!(tool["name"], "is_funny");
        assert_eq!(tool["strict"], true);
        assert_eq!(tool["parameters"]["required"], json!(["is_funny"]));
        assert_eq!(tool["parameters"]["additionalProperties"], false);
    }

    #[tokio::test]
    async fn negotiate_returns_first_function_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(body_partial_json(json!({
                "model": "gpt-test",
                "tool_choice": "auto",
                "input": [{"type": "message", "role": "user", "content": "tell me a joke"}],
                "tools": [{"type": "function", "name": "is_funny"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(function_call_response()))
            .expect(1)
            .mount(&server)
            .await;

        let negotiation = adapter(&server)
            .negotiate(NegotiateRequest {
                text: "tell me a joke".into(),
            })
            .await
            .unwrap();
        assert_eq!(negotiation.response_id, "resp_r1");
        let call = negotiation.tool_invocation.unwrap();
        assert_eq!(call.call_id, "call_abc");
        assert_eq!(call.name, "is_funny");
        assert_eq!(call.arguments, "{\"is_funny\":true}");
    }

    #[tokio::test]
    async fn negotiate_without_tool_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "resp_plain",
                "output": [{"type": "message", "content": [{"type": "output_text", "text": "hi"}]}]
            })))
            .mount(&server)
            .await;

        let negotiation = adapter(&server)
            .negotiate(NegotiateRequest { text: "hi".into() })
            .await
            .unwrap();
        assert!(negotiation.tool_invocation.is_none());
    }

    #[tokio::test]
    async fn finalize_replays_tool_call_and_threads_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(body_partial_json(json!({
                "tool_choice": "none",
                "previous_response_id": "resp_T0",
                "input": [
                    {"type": "message", "role": "user", "content": "tell me a joke"},
                    {"type": "function_call", "call_id": "call_abc", "name": "is_funny",
                     "arguments": "{\"is_funny\":true}"},
                    {"type": "function_call_output", "call_id": "call_abc", "output": "true"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "resp_T1",
                "output": [{"type": "message", "content": [
                    {"type": "output_text", "text": "Why did..."}
                ]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = adapter(&server)
            .finalize(FinalizeRequest {
                text: "tell me a joke".into(),
                tool: Some(ResolvedTool {
                    invocation: ToolInvocation {
                        call_id: "call_abc".into(),
                        name: "is_funny".into(),
                        arguments: "{\"is_funny\":true}".into(),
                    },
                    outcome: true,
                }),
                continuity_token: Some("resp_T0".into()),
            })
            .await
            .unwrap();
        assert_eq!(completion.reply_text, "Why did...");
        assert_eq!(completion.continuity_token, "resp_T1");
    }

    #[tokio::test]
    async fn finalize_without_content_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "resp_empty",
                "output": [{"type": "message", "content": [{"type": "output_text", "text": "  "}]}]
            })))
            .mount(&server)
            .await;

        let completion = adapter(&server)
            .finalize(FinalizeRequest {
                text: "hmm".into(),
                tool: None,
                continuity_token: None,
            })
            .await
            .unwrap();
        assert_eq!(completion.reply_text, FALLBACK_REPLY);
        assert_eq!(completion.continuity_token, "resp_empty");
    }

    #[tokio::test]
    async fn finalize_without_tool_sends_only_user_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "resp_x", "output": []
            })))
            .mount(&server)
            .await;

        adapter(&server)
            .finalize(FinalizeRequest {
                text: "plain".into(),
                tool: None,
                continuity_token: None,
            })
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["input"].as_array().unwrap().len(), 1);
        assert!(body.get("previous_response_id").is_none());
        assert_eq!(body["tool_choice"], "none");
    }

    #[test]
    fn adapter_metadata() {
        let client = OpenAiClient::new("k", "http://localhost", Duration::from_secs(1)).unwrap();
        let adapter = OpenAiCompletion::with_client(client, "m".into(), "i".into(), None);
        assert_eq!(adapter.name(), "openai");
        assert_eq!(adapter.adapter_type(), AdapterType::Completion);
    }
}
