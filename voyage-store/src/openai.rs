//! OpenAI Chat Completions client
//!
//! Implements `LanguageModel` for blocking completions (with function tools
//! and JSON-schema structured output) and for streamed text deltas.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use voyage_core::llm::{
    ChatMessage, Completion, CompletionRequest, LanguageModel, LlmError, Role, TextStream, ToolCall,
};
use voyage_shared::pii::Masked;
use voyage_shared::SseDecoder;

use crate::app_config::LlmConfig;

pub struct OpenAiClient {
    model: String,
    api_key: Option<Masked<String>>,
    base_url: String,
    http: Client,
}

impl OpenAiClient {
    /// A missing key is not an error here; calls fail with `NotConfigured`.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let api_key = config.api_key.clone().filter(|k| !k.is_blank());
        if api_key.is_none() {
            warn!("No OpenAI API key configured; language model calls will fail");
        }

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.api_key.as_ref().map(|k| k.expose().as_str()).ok_or(LlmError::NotConfigured)
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": convert_messages(&request.messages),
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        if !request.tools.is_empty() {
            body["tools"] = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            body["tool_choice"] = json!("auto");
        }

        if let Some(schema) = &request.response_schema {
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": {
                    "name": schema.name,
                    "schema": schema.schema,
                }
            });
        }

        body
    }

    async fn post(&self, body: &Value) -> Result<reqwest::Response, LlmError> {
        let api_key = self.api_key()?;
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(%status, "post: API error");
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn convert_messages(messages: &[ChatMessage]) -> Vec<Value> {
    messages
        .iter()
        .map(|msg| match msg.role {
            Role::Tool => json!({
                "role": "tool",
                "tool_call_id": msg.tool_call_id,
                "content": msg.content,
            }),
            Role::Assistant if !msg.tool_calls.is_empty() => {
                let calls: Vec<Value> = msg
                    .tool_calls
                    .iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments.to_string(),
                            }
                        })
                    })
                    .collect();
                let mut value = json!({ "role": "assistant", "tool_calls": calls });
                if !msg.content.is_empty() {
                    value["content"] = json!(msg.content);
                }
                value
            }
            role => json!({ "role": role_name(role), "content": msg.content }),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    id: String,
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    arguments: String,
}

fn parse_response(api_response: OpenAiResponse) -> Result<Completion, LlmError> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("no choices in response".to_string()))?;

    let tool_calls = choice
        .message
        .tool_calls
        .into_iter()
        .map(|tc| ToolCall {
            id: tc.id,
            name: tc.function.name,
            arguments: serde_json::from_str(&tc.function.arguments).unwrap_or_else(|_| json!({})),
        })
        .collect();

    Ok(Completion {
        text: choice.message.content.filter(|c| !c.is_empty()),
        tool_calls,
    })
}

/// `choices[0].delta.content` of a streamed chunk, when non-empty.
fn delta_content(event: &Value) -> Option<String> {
    event["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        debug!(model = %self.model, tools = request.tools.len(), "complete: called");
        let body = self.build_request_body(&request);
        let response = self.post(&body).await?;
        let api_response: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
        parse_response(api_response)
    }

    async fn stream_text(&self, request: CompletionRequest) -> Result<TextStream, LlmError> {
        debug!(model = %self.model, "stream_text: called");
        let mut body = self.build_request_body(&CompletionRequest {
            tools: Vec::new(),
            response_schema: None,
            ..request
        });
        body["stream"] = json!(true);

        let response = self.post(&body).await?;
        let mut decoder = SseDecoder::new();
        let deltas = response
            .bytes_stream()
            .map(move |chunk| -> Vec<Result<String, LlmError>> {
                match chunk {
                    Ok(bytes) => decoder.feed(&bytes).iter().filter_map(delta_content).map(Ok).collect(),
                    Err(e) => vec![Err(LlmError::Network(e.to_string()))],
                }
            })
            .flat_map(stream::iter);

        Ok(Box::pin(deltas))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voyage_core::llm::ToolSpec;

    fn client(api_key: Option<&str>) -> OpenAiClient {
        OpenAiClient::from_config(&LlmConfig {
            api_key: api_key.map(|k| Masked(k.to_string())),
            base_url: "https://api.openai.com/v1/".to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_request_body_carries_tools_and_schema() {
        let request = CompletionRequest::new(vec![ChatMessage::system("plan"), ChatMessage::user("Kyoto")])
            .with_tool(ToolSpec {
                name: "updateTrip".to_string(),
                description: "Update the trip".to_string(),
                parameters: json!({"type": "object"}),
            })
            .with_schema("prompts", json!({"type": "object"}))
            .temperature(0.0)
            .max_tokens(50);

        let c = client(Some("sk-test"));
        assert_eq!(c.endpoint(), "https://api.openai.com/v1/chat/completions");

        let body = c.build_request_body(&request);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 50);
        assert_eq!(body["messages"][1], json!({"role": "user", "content": "Kyoto"}));
        assert_eq!(body["tools"][0]["function"]["name"], "updateTrip");
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["response_format"]["json_schema"]["name"], "prompts");
    }

    #[test]
    fn test_tool_round_trip_messages() {
        let call = ToolCall {
            id: "call_9".to_string(),
            name: "runTripSearch".to_string(),
            arguments: json!({"origin": "NYC"}),
        };
        let converted = convert_messages(&[
            ChatMessage::assistant_tool_calls(vec![call]),
            ChatMessage::tool_result("call_9", "No flights found."),
        ]);
        assert_eq!(converted[0]["tool_calls"][0]["function"]["arguments"], r#"{"origin":"NYC"}"#);
        assert!(converted[0].get("content").is_none());
        assert_eq!(converted[1]["tool_call_id"], "call_9");
    }

    #[test]
    fn test_parse_response_with_tool_call() {
        let api: OpenAiResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "updateTrip", "arguments": "{\"budget\": 2500}"}
                    }]
                }
            }]
        }))
        .unwrap();
        let completion = parse_response(api).unwrap();
        assert_eq!(completion.text, None);
        assert_eq!(completion.tool_call("updateTrip").unwrap().arguments, json!({"budget": 2500}));

        let empty: OpenAiResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(parse_response(empty), Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn test_delta_content() {
        assert_eq!(
            delta_content(&json!({"choices": [{"delta": {"content": "Two new"}}]})),
            Some("Two new".to_string())
        );
        assert_eq!(delta_content(&json!({"choices": [{"delta": {"role": "assistant"}}]})), None);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let result = client(Some("  ")).complete(CompletionRequest::new(vec![])).await;
        assert!(matches!(result, Err(LlmError::NotConfigured)));
    }
}
