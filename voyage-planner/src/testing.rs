//! Language model double for tests in this crate and the API crate.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use voyage_core::llm::{Completion, CompletionRequest, LanguageModel, LlmError, TextStream, ToolCall};

/// Replays queued completions in order and records every request.
/// An exhausted queue behaves like an unconfigured model.
#[derive(Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<Completion, LlmError>>>,
    chunks: Mutex<Option<Vec<String>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(self, text: &str) -> Self {
        self.push(Ok(Completion {
            text: Some(text.to_string()),
            tool_calls: vec![],
        }))
    }

    pub fn json(self, value: Value) -> Self {
        self.text(&value.to_string())
    }

    pub fn tool(self, name: &str, arguments: Value) -> Self {
        self.push(Ok(Completion {
            text: None,
            tool_calls: vec![ToolCall {
                id: "call_1".to_string(),
                name: name.to_string(),
                arguments,
            }],
        }))
    }

    pub fn failure(self) -> Self {
        self.push(Err(LlmError::Network("connection reset".to_string())))
    }

    pub fn streaming(self, chunks: &[&str]) -> Self {
        *self.chunks.lock().unwrap() = Some(chunks.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn no_tool_call(self) -> Self {
        self.json(json!({}))
    }

    fn push(self, reply: Result<Completion, LlmError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn request(&self, index: usize) -> CompletionRequest {
        self.requests.lock().unwrap()[index].clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::NotConfigured))
    }

    async fn stream_text(&self, request: CompletionRequest) -> Result<TextStream, LlmError> {
        self.requests.lock().unwrap().push(request);
        match self.chunks.lock().unwrap().clone() {
            Some(chunks) => Ok(Box::pin(futures_util::stream::iter(chunks.into_iter().map(Ok)))),
            None => Err(LlmError::NotConfigured),
        }
    }
}
