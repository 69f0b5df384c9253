//! Embed view API
//!
//! Backs the iframe-embeddable chat page. Unknown ids render a not-found
//! state with a 404 status instead of failing.

use crate::api::utils::RouterState;
use crate::embed::{embed_snippet, resolve, EmbedView};
use crate::state::AgentRecord;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Embed view body
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmbedViewResponse {
    /// The agent was found
    Ready {
        /// The agent to chat with
        agent: AgentRecord,
        /// Snippet for re-embedding
        #[serde(rename = "embedCode")]
        embed_code: String,
    },
    /// The agent was not found
    NotFound {
        /// The id that was requested
        #[serde(rename = "agentId")]
        agent_id: Option<String>,
        /// User-facing explanation
        error: String,
    },
}

impl IntoResponse for EmbedViewResponse {
    fn into_response(self) -> Response {
        let status = match self {
            EmbedViewResponse::Ready { .. } => StatusCode::OK,
            EmbedViewResponse::NotFound { .. } => StatusCode::NOT_FOUND,
        };
        (status, Json(self)).into_response()
    }
}

fn render(state: &RouterState, view: EmbedView) -> EmbedViewResponse {
    match view {
        EmbedView::Ready(agent) => EmbedViewResponse::Ready {
            embed_code: embed_snippet(&state.config.embed.public_origin, &agent.id),
            agent,
        },
        EmbedView::NotFound { agent_id, reason } => EmbedViewResponse::NotFound {
            agent_id,
            error: reason,
        },
    }
}

/// GET /embed/:id - Embed view for an agent
pub async fn embed_view(
    State(state): State<RouterState>,
    Path(id): Path<String>,
) -> EmbedViewResponse {
    let view = {
        let controller = state.agents.read().await;
        resolve(controller.store(), Some(id.as_str()))
    };
    render(&state, view)
}

/// GET /embed - Embed path without an agent id
pub async fn embed_view_missing(State(state): State<RouterState>) -> EmbedViewResponse {
    let view = {
        let controller = state.agents.read().await;
        resolve(controller.store(), None)
    };
    render(&state, view)
}
