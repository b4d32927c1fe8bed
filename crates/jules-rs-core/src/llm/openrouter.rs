//! OpenRouter chat-completions client.

use super::{CompletionClient, CompletionError, CompletionRequest, CompletionResponse};
use async_trait::async_trait;
use jules_rs_config::LlmConfig;
use jules_rs_protocol::{ChatMessage, ToolCall};
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenRouterClient {
    client: Client,
    api_url: String,
    model: String,
    api_key: String,
    request_log: Option<PathBuf>,
    response_log: Option<PathBuf>,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
}

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

impl OpenRouterClient {
    /// Create a client for `api_url` using `model` and a bearer token.
    pub fn new(
        api_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            request_log: None,
            response_log: None,
        }
    }

    /// Build a client from config, reading the token from the configured env var.
    pub fn from_config(config: &LlmConfig) -> Result<Self, CompletionError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| CompletionError::MissingApiKey(config.api_key_env.clone()))?;
        let mut client = Self::new(&config.api_url, &config.model, api_key);
        if let Some(path) = &config.request_log {
            client = client.with_request_log(path.clone());
        }
        if let Some(path) = &config.response_log {
            client = client.with_response_log(path.clone());
        }
        Ok(client)
    }

    /// Append every request body to `path`.
    pub fn with_request_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.request_log = Some(path.into());
        self
    }

    /// Append every raw response body to `path`.
    pub fn with_response_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.response_log = Some(path.into());
        self
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let body = RequestBody {
            model: &self.model,
            messages: &request.messages,
            tools: request
                .tools
                .iter()
                .map(|spec| spec.as_function_tool())
                .collect(),
        };
        let payload = serde_json::to_string(&body)
            .map_err(|err| CompletionError::InvalidResponse(err.to_string()))?;
        if let Some(path) = &self.request_log {
            append_line(path, &payload)?;
        }
        debug!(
            "sending completion request (model={}, turns={}, tools={})",
            self.model,
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if let Some(path) = &self.response_log {
            append_line(path, text.trim())?;
        }
        info!("completion response received (status={})", status.as_u16());

        if !status.is_success() {
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        parse_response(&text)
    }
}

/// Interpret a success body; exactly one error-free choice is expected.
fn parse_response(text: &str) -> Result<CompletionResponse, CompletionError> {
    let body: ResponseBody = serde_json::from_str(text)
        .map_err(|err| CompletionError::InvalidResponse(err.to_string()))?;
    if let Some(error) = body.error {
        return Err(CompletionError::Api(error.to_string()));
    }
    let mut choices = body.choices;
    if choices.len() != 1 {
        return Err(CompletionError::InvalidResponse(format!(
            "expected exactly one choice, got {}",
            choices.len()
        )));
    }
    let choice = choices.remove(0);
    if let Some(error) = choice.error {
        return Err(CompletionError::Api(error.to_string()));
    }
    let message = choice.message.ok_or_else(|| {
        CompletionError::InvalidResponse("choice has no message".to_string())
    })?;
    Ok(CompletionResponse {
        content: message.content.unwrap_or_default(),
        tool_calls: message.tool_calls.unwrap_or_default(),
    })
}

fn append_line(path: &Path, line: &str) -> Result<(), CompletionError> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}
