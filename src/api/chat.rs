//! Chat API
//!
//! Drives the chat session for the selected agent.
//! Flow: user message -> session (history window + agent config) -> completion endpoint -> reply

use crate::api::utils::RouterState;
use crate::chat::{ChatMessage, Notice, SendOutcome};
use crate::state::AgentId;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Request body for sending a chat message
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    /// Message text; surrounding whitespace is trimmed
    pub text: String,
}

/// Current conversation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryResponse {
    /// Agent the conversation belongs to
    pub agent_id: Option<AgentId>,
    /// Messages, oldest first
    pub messages: Vec<ChatMessage>,
    /// Whether a request is outstanding
    pub sending: bool,
}

/// GET /api/chat/messages - Current conversation
pub async fn get_messages(State(state): State<RouterState>) -> Json<ChatHistoryResponse> {
    Json(ChatHistoryResponse {
        agent_id: state.chat.agent_id(),
        messages: state.chat.messages(),
        sending: state.chat.is_sending(),
    })
}

/// POST /api/chat/messages - Send a message to the selected agent
///
/// Failures are reported in the outcome body, not as HTTP errors; the
/// controller lock is released before the request goes out.
pub async fn send_message(
    State(state): State<RouterState>,
    Json(request): Json<SendMessageRequest>,
) -> Json<SendOutcome> {
    let agent = state.agents.read().await.selected().cloned();
    Json(state.chat.send(agent.as_ref(), &request.text).await)
}

/// DELETE /api/chat/messages - Clear the conversation
pub async fn clear_messages(State(state): State<RouterState>) -> Json<Notice> {
    Json(state.chat.clear())
}
