//! Embed surface
//!
//! Resolves the agent behind an embed path (`/embed/<id>`) and renders the
//! iframe snippet third-party pages paste in. An unknown or missing id
//! resolves to a not-found state rather than an error.

use crate::state::{AgentRecord, AgentStore};
use tracing::debug;

/// Height of the embedded iframe in pixels
pub const EMBED_HEIGHT: u32 = 600;

/// What the embed view should show
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedView {
    /// The agent exists; show its chat
    Ready(AgentRecord),
    /// Nothing to show
    NotFound {
        /// The id that was requested, if any
        agent_id: Option<String>,
        /// User-facing explanation
        reason: String,
    },
}

/// Resolve an embed path's agent id against the store
pub fn resolve(store: &AgentStore, agent_id: Option<&str>) -> EmbedView {
    let Some(id) = agent_id.map(str::trim).filter(|id| !id.is_empty()) else {
        return EmbedView::NotFound {
            agent_id: None,
            reason: "No agent ID provided".to_string(),
        };
    };

    match store.get_by_id(id) {
        Some(agent) => EmbedView::Ready(agent),
        None => {
            debug!(agent_id = %id, "Embed requested for unknown agent");
            EmbedView::NotFound {
                agent_id: Some(id.to_string()),
                reason: "Agent not found".to_string(),
            }
        }
    }
}

/// URL of the embed view for `agent_id`
pub fn embed_url(origin: &str, agent_id: &str) -> String {
    format!("{}/embed/{}", origin.trim_end_matches('/'), agent_id)
}

/// Copyable iframe snippet for `agent_id`
pub fn embed_snippet(origin: &str, agent_id: &str) -> String {
    format!(
        r#"<iframe src="{}" width="100%" height="{}" frameborder="0"></iframe>"#,
        embed_url(origin, agent_id),
        EMBED_HEIGHT
    )
}
