//! API module
//!
//! Contains HTTP request handlers and the route table

pub mod agents;
pub mod chat;
pub mod embed;
pub mod utils;

pub use utils::RouterState;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    message: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        message: "Agent builder is healthy".to_string(),
    })
}

/// Build the application routes
/// Middleware layers are added by the caller
pub fn router(state: RouterState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        // Agent management API
        .route(
            "/api/agents",
            get(agents::list_agents).post(agents::save_agent),
        )
        .route(
            "/api/agents/:id",
            get(agents::get_agent).delete(agents::delete_agent),
        )
        .route("/api/agents/:id/select", post(agents::select_agent))
        .route("/api/agents/:id/embed-code", get(agents::embed_code))
        .route(
            "/api/selection",
            get(agents::get_selection).delete(agents::clear_selection),
        )
        // Chat session API
        .route(
            "/api/chat/messages",
            get(chat::get_messages)
                .post(chat::send_message)
                .delete(chat::clear_messages),
        )
        // Embed view
        .route("/embed", get(embed::embed_view_missing))
        .route("/embed/:id", get(embed::embed_view))
        .with_state(state)
}
