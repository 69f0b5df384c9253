//! Agent management API handlers
//!
//! Contains HTTP request handlers for agent CRUD operations and selection.

use crate::api::utils::{sync_chat_binding, RouterState};
use crate::embed::{embed_snippet, embed_url};
use crate::error::AppError;
use crate::state::{AgentDraft, AgentId, AgentRecord};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;

/// Agent response type
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    /// The stored record
    #[serde(flatten)]
    pub agent: AgentRecord,
    /// Truncated system instructions for list views
    pub instructions_preview: String,
}

impl From<&AgentRecord> for AgentResponse {
    fn from(agent: &AgentRecord) -> Self {
        Self {
            agent: agent.clone(),
            instructions_preview: agent.instructions_preview(),
        }
    }
}

/// Agents list response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentsListResponse {
    /// All agents in insertion order
    pub agents: Vec<AgentResponse>,
    /// Total number of agents
    pub count: usize,
    /// ID of the selected agent, if any
    pub selected_id: Option<AgentId>,
}

/// Selection response
#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    /// The selected agent, if any
    pub selected: Option<AgentRecord>,
}

/// Message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message
    pub message: String,
    /// Status indicator (e.g., "ok", "error")
    pub status: String,
}

/// Embed code response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedCodeResponse {
    /// Agent the snippet refers to
    pub agent_id: AgentId,
    /// URL of the embed view
    pub url: String,
    /// Copyable iframe snippet
    pub snippet: String,
}

/// GET /api/agents - List all agents
pub async fn list_agents(State(state): State<RouterState>) -> Json<AgentsListResponse> {
    let controller = state.agents.read().await;
    let agents: Vec<AgentResponse> = controller.agents().iter().map(AgentResponse::from).collect();

    Json(AgentsListResponse {
        count: agents.len(),
        agents,
        selected_id: controller.selected().map(|agent| agent.id.clone()),
    })
}

/// GET /api/agents/:id - Get a specific agent
pub async fn get_agent(
    State(state): State<RouterState>,
    Path(id): Path<AgentId>,
) -> Result<Json<AgentResponse>, AppError> {
    let controller = state.agents.read().await;
    let agent = controller
        .store()
        .get_by_id(&id)
        .ok_or_else(|| AppError::AgentNotFound(id.clone()))?;

    Ok(Json(AgentResponse::from(&agent)))
}

/// POST /api/agents - Create an agent, or update one when the draft carries an id
///
/// The saved agent becomes the selection.
pub async fn save_agent(
    State(state): State<RouterState>,
    Json(draft): Json<AgentDraft>,
) -> Result<(StatusCode, Json<AgentResponse>), AppError> {
    let mut controller = state.agents.write().await;
    let is_new = draft
        .id
        .as_deref()
        .map_or(true, |id| controller.store().get_by_id(id).is_none());

    let agent = controller.save_draft(&draft)?;
    sync_chat_binding(&controller, &state.chat);

    let status = if is_new {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(AgentResponse::from(&agent))))
}

/// DELETE /api/agents/:id - Delete an agent
pub async fn delete_agent(
    State(state): State<RouterState>,
    Path(id): Path<AgentId>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut controller = state.agents.write().await;
    let agent = controller
        .store()
        .get_by_id(&id)
        .ok_or_else(|| AppError::AgentNotFound(id.clone()))?;

    controller.delete(&id)?;
    sync_chat_binding(&controller, &state.chat);

    Ok(Json(MessageResponse {
        message: format!("Agent \"{}\" deleted successfully.", agent.name),
        status: "ok".to_string(),
    }))
}

/// POST /api/agents/:id/select - Select an agent
pub async fn select_agent(
    State(state): State<RouterState>,
    Path(id): Path<AgentId>,
) -> Result<Json<SelectionResponse>, AppError> {
    let mut controller = state.agents.write().await;
    controller.load();
    let selected = controller
        .select(&id)
        .cloned()
        .ok_or_else(|| AppError::AgentNotFound(id.clone()))?;
    sync_chat_binding(&controller, &state.chat);

    Ok(Json(SelectionResponse {
        selected: Some(selected),
    }))
}

/// GET /api/selection - Get the selected agent
pub async fn get_selection(State(state): State<RouterState>) -> Json<SelectionResponse> {
    let controller = state.agents.read().await;
    Json(SelectionResponse {
        selected: controller.selected().cloned(),
    })
}

/// DELETE /api/selection - Deselect the current agent
pub async fn clear_selection(State(state): State<RouterState>) -> Json<SelectionResponse> {
    let mut controller = state.agents.write().await;
    controller.clear_selection();
    sync_chat_binding(&controller, &state.chat);
    Json(SelectionResponse { selected: None })
}

/// GET /api/agents/:id/embed-code - Get the iframe snippet for an agent
pub async fn embed_code(
    State(state): State<RouterState>,
    Path(id): Path<AgentId>,
) -> Result<Json<EmbedCodeResponse>, AppError> {
    let controller = state.agents.read().await;
    let agent = controller
        .store()
        .get_by_id(&id)
        .ok_or_else(|| AppError::AgentNotFound(id.clone()))?;

    let origin = &state.config.embed.public_origin;
    Ok(Json(EmbedCodeResponse {
        url: embed_url(origin, &agent.id),
        snippet: embed_snippet(origin, &agent.id),
        agent_id: agent.id,
    }))
}
