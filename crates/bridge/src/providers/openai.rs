//! OpenAI Responses API backend.

use crate::model::{
    ModelError, Provider, ProviderInput, ProviderRequest, ProviderResponse, Role, ToolCallRequest,
    ToolCallResult, Turn,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

const OPENAI_RESPONSES_URL: &str = "https://api.openai.com/v1/responses";

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    input: Vec<InputItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_response_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDef<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<Reasoning<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextFormat>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum InputItem {
    Message {
        role: &'static str,
        content: Vec<ContentPart>,
    },
    FunctionCallOutput {
        #[serde(rename = "type")]
        item_type: &'static str,
        call_id: String,
        output: String,
    },
}

impl InputItem {
    fn result(result: &ToolCallResult) -> Self {
        Self::FunctionCallOutput {
            item_type: "function_call_output",
            call_id: result.id.clone(),
            output: result.text.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ContentPart {
    #[serde(rename = "type")]
    part_type: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
struct ToolDef<'a> {
    #[serde(rename = "type")]
    tool_type: &'static str,
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Serialize)]
struct Reasoning<'a> {
    effort: &'a str,
}

#[derive(Debug, Serialize)]
struct TextFormat {
    format: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    id: String,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum OutputItem {
    #[serde(rename = "message")]
    Message {
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    #[serde(rename = "function_call")]
    FunctionCall {
        name: String,
        call_id: String,
        arguments: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(default)]
    text: String,
}

/// Builder for creating a Responses API backend.
#[derive(Debug, Clone)]
pub struct ResponsesBackendBuilder {
    api_key: String,
    base_url: String,
}

impl ResponsesBackendBuilder {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_RESPONSES_URL.into(),
        }
    }

    /// Override the endpoint, e.g. for a compatible proxy.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> ResponsesBackend {
        ResponsesBackend {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            base_url: self.base_url,
        }
    }
}

/// OpenAI Responses API backend.
pub struct ResponsesBackend {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ResponsesBackend {
    pub fn builder(api_key: impl Into<String>) -> ResponsesBackendBuilder {
        ResponsesBackendBuilder::new(api_key)
    }
}

impl std::fmt::Display for ResponsesBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai-responses({})", self.base_url)
    }
}

fn role_to_api_str(role: Role) -> &'static str {
    match role {
        Role::Developer => "developer",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::ToolResult => "tool",
    }
}

fn turn_items(turn: &Turn) -> Vec<InputItem> {
    if turn.role == Role::ToolResult {
        return turn.tool_results.iter().map(InputItem::result).collect();
    }
    // Assistant turns echo prior model output, which the API expects as
    // output_text parts rather than input_text.
    let part_type = if turn.role == Role::Assistant {
        "output_text"
    } else {
        "input_text"
    };
    vec![InputItem::Message {
        role: role_to_api_str(turn.role),
        content: vec![ContentPart {
            part_type,
            text: turn.text().to_string(),
        }],
    }]
}

fn build_input(input: &ProviderInput<'_>) -> Vec<InputItem> {
    match input {
        ProviderInput::Turns(turns) => turns.iter().flat_map(turn_items).collect(),
        ProviderInput::ToolResults(results) => results.iter().map(InputItem::result).collect(),
    }
}

/// Function-call arguments arrive as a JSON-encoded string.
fn parse_arguments(raw: &str) -> Map<String, Value> {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default()
}

fn convert(api: ApiResponse) -> ProviderResponse {
    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for item in api.output {
        match item {
            OutputItem::Message { content } => {
                for part in content {
                    text.push_str(&part.text);
                }
            }
            OutputItem::FunctionCall {
                name,
                call_id,
                arguments,
            } => tool_calls.push(ToolCallRequest {
                id: call_id,
                name,
                arguments: parse_arguments(&arguments),
            }),
            OutputItem::Other => {}
        }
    }
    ProviderResponse {
        text,
        tool_calls,
        continuation: Some(api.id),
    }
}

#[async_trait]
impl Provider for ResponsesBackend {
    async fn respond(&self, request: ProviderRequest<'_>) -> Result<ProviderResponse, ModelError> {
        let tools: Vec<ToolDef<'_>> = request
            .tools
            .iter()
            .map(|spec| ToolDef {
                tool_type: "function",
                name: &spec.name,
                description: &spec.description,
                parameters: &spec.schema,
            })
            .collect();

        let text = request.schema.map(|schema| TextFormat {
            format: json!({
                "type": "json_schema",
                "name": schema.name,
                "strict": true,
                "schema": schema.to_json_schema(),
            }),
        });

        let api_request = ApiRequest {
            model: &request.params.model,
            input: build_input(&request.input),
            previous_response_id: request.continuation,
            tools,
            max_output_tokens: request.params.max_output_tokens,
            reasoning: request
                .params
                .reasoning_effort
                .as_deref()
                .map(|effort| Reasoning { effort }),
            text,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        debug!(
            response_id = %api_response.id,
            items = api_response.output.len(),
            "responses api round trip",
        );
        Ok(convert(api_response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_serialize_to_input_items() {
        let turns = vec![
            Turn::developer("you may call tool 'lookup'"),
            Turn::user("what is X?"),
            Turn::tool_results(vec![ToolCallResult::success("call_1", "X is 42")]),
        ];
        let items = build_input(&ProviderInput::Turns(&turns));
        let encoded = serde_json::to_value(&items).unwrap();
        assert_eq!(encoded[0]["role"], "developer");
        assert_eq!(encoded[0]["content"][0]["type"], "input_text");
        assert_eq!(encoded[1]["content"][0]["text"], "what is X?");
        assert_eq!(encoded[2]["type"], "function_call_output");
        assert_eq!(encoded[2]["call_id"], "call_1");
        assert_eq!(encoded[2]["output"], "X is 42");
    }

    #[test]
    fn assistant_turns_use_output_text() {
        let turns = vec![Turn::assistant("earlier answer")];
        let items = build_input(&ProviderInput::Turns(&turns));
        let encoded = serde_json::to_value(&items).unwrap();
        assert_eq!(encoded[0]["content"][0]["type"], "output_text");
    }

    #[test]
    fn response_output_converts_to_text_and_calls() {
        let api: ApiResponse = serde_json::from_value(json!({
            "id": "resp_123",
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [{"type": "output_text", "text": "X is 42."}]},
                {"type": "function_call", "name": "lookup", "call_id": "call_9",
                 "arguments": "{\"term\": \"X\"}"}
            ]
        }))
        .unwrap();
        let converted = convert(api);
        assert_eq!(converted.text, "X is 42.");
        assert_eq!(converted.continuation.as_deref(), Some("resp_123"));
        assert_eq!(converted.tool_calls.len(), 1);
        assert_eq!(converted.tool_calls[0].name, "lookup");
        assert_eq!(converted.tool_calls[0].arguments.get("term"), Some(&json!("X")));
    }

    #[test]
    fn undecodable_arguments_become_empty() {
        assert!(parse_arguments("not json").is_empty());
        assert!(parse_arguments("[1, 2]").is_empty());
    }
}
