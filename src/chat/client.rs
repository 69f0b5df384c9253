//! Chat completion client
//!
//! Wire types for the completion endpoint and the HTTP transport that posts
//! them. The endpoint receives the recent message window plus the agent's
//! configuration and answers with `{ "message": "..." }`. Any truthy `error`
//! field in the body is a failure, whatever the HTTP status.

use crate::chat::models::{ChatMessage, MessageRole};
use crate::config::ChatConfig;
use crate::state::AgentRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

/// Errors from a chat completion round trip
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The request never produced a response (connection refused, timeout, ...)
    #[error("Failed to reach chat endpoint: {0}")]
    Transport(String),

    /// The endpoint answered with a non-success status
    #[error("HTTP {status}: {reason}")]
    Status {
        /// Numeric HTTP status
        status: u16,
        /// Canonical reason phrase
        reason: String,
    },

    /// The response body carried an `error` field
    #[error("{0}")]
    Remote(String),

    /// The response body could not be used
    #[error("Invalid response from chat endpoint: {0}")]
    InvalidResponse(String),
}

/// One `{role, content}` pair in the outbound history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WireMessage {
    /// Sender role
    pub role: MessageRole,
    /// Message text
    pub content: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Agent settings forwarded with every request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfigPayload {
    /// System prompt
    pub system_instructions: String,
    /// Sampling temperature
    pub temperature: f64,
    /// Nucleus sampling mass
    pub top_p: f64,
    /// Model override, omitted when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_override: Option<String>,
}

impl From<&AgentRecord> for AgentConfigPayload {
    fn from(agent: &AgentRecord) -> Self {
        Self {
            system_instructions: agent.system_instructions.clone(),
            temperature: agent.temperature,
            top_p: agent.top_p,
            model_override: agent.model_override.clone(),
        }
    }
}

/// Request body posted to the completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Recent conversation history, oldest first
    pub messages: Vec<WireMessage>,
    /// Configuration of the agent being chatted with
    pub agent_config: AgentConfigPayload,
}

/// Response body from the completion endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ChatReply {
    /// Assistant reply text
    #[serde(default)]
    pub message: Option<String>,
    /// Error reported by the endpoint
    #[serde(default)]
    pub error: Option<Value>,
}

impl ChatReply {
    /// Extract the reply text, turning a reported error into `ChatError`
    pub fn into_message(self) -> Result<String, ChatError> {
        if let Some(error) = self.error.filter(is_truthy) {
            let description = match error {
                Value::String(text) => text,
                other => other.to_string(),
            };
            return Err(ChatError::Remote(description));
        }
        self.message
            .ok_or_else(|| ChatError::InvalidResponse("response has no message".to_string()))
    }
}

/// Truthiness of a JSON value in the sense the endpoint's clients use it
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Something that can answer a chat request
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request` and return the assistant's reply text
    async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError>;
}

/// HTTP transport posting JSON to the completion endpoint
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChatClient {
    /// Create a client posting to `endpoint` with a shared reqwest client
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Build a client from configuration
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn from_config(config: &ChatConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self::new(builder.build()?, config.endpoint.clone()))
    }

    /// Endpoint URL requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpChatClient {
    async fn complete(&self, request: &ChatRequest) -> Result<String, ChatError> {
        debug!(
            endpoint = %self.endpoint,
            message_count = request.messages.len(),
            model = ?request.agent_config.model_override,
            "Calling chat endpoint"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            error!(
                status_code = status.as_u16(),
                endpoint = %self.endpoint,
                "Chat endpoint returned error status"
            );
            return Err(ChatError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let reply: ChatReply =
            serde_json::from_str(&body).map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        reply.into_message()
    }
}
