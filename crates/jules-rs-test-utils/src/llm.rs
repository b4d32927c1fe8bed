use async_trait::async_trait;
use jules_rs_core::{CompletionClient, CompletionError, CompletionRequest, CompletionResponse};
use jules_rs_protocol::ToolCall;
use jules_rs_tools::encode_call;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Build a `schedule_message` call for a stubbed response.
pub fn schedule_call(call_id: &str, when: &str, topic: &str) -> ToolCall {
    encode_call(call_id, when, topic)
}

/// Answers every request with the same turn.
#[derive(Debug, Clone)]
pub struct FixedLLM {
    response: CompletionResponse,
}

impl FixedLLM {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            response: CompletionResponse::text(text),
        }
    }

    pub fn with_tool_calls(text: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            response: CompletionResponse::with_tool_calls(text, tool_calls),
        }
    }
}

#[async_trait]
impl CompletionClient for FixedLLM {
    async fn complete(
        &self,
        _request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        Ok(self.response.clone())
    }
}

/// Plays back queued turns in order; fails once the queue runs dry.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLLM {
    responses: Arc<Mutex<VecDeque<CompletionResponse>>>,
}

impl ScriptedLLM {
    pub fn new(responses: impl IntoIterator<Item = CompletionResponse>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().collect())),
        }
    }

    /// Turns not yet played back.
    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedLLM {
    async fn complete(
        &self,
        _request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| CompletionError::InvalidResponse("script exhausted".to_string()))
    }
}

/// Fixed text reply that records every request it receives.
#[derive(Debug, Clone)]
pub struct RecordingLLM {
    response: String,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl RecordingLLM {
    pub fn new(response: impl Into<String>) -> (Self, Arc<Mutex<Vec<CompletionRequest>>>) {
        let requests = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                response: response.into(),
                requests: requests.clone(),
            },
            requests,
        )
    }
}

#[async_trait]
impl CompletionClient for RecordingLLM {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.requests.lock().push(request.clone());
        Ok(CompletionResponse::text(self.response.clone()))
    }
}

/// Endpoint that always fails with a status error.
#[derive(Debug, Clone)]
pub struct FailingLLM {
    status: u16,
    body: String,
}

impl FailingLLM {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
impl CompletionClient for FailingLLM {
    async fn complete(
        &self,
        _request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        Err(CompletionError::Status {
            status: self.status,
            body: self.body.clone(),
        })
    }
}
