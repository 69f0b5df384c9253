//! API utility functions
//!
//! Shared router state and helpers used by several handler modules.

use crate::chat::ChatSession;
use crate::config::Config;
use crate::state::{AgentSessionController, SharedController};
use std::sync::Arc;
use tokio::sync::RwLock;

/// State shared by all handlers
#[derive(Clone)]
pub struct RouterState {
    /// Loaded agents and selection
    pub agents: SharedController,
    /// Chat session for the selected agent
    pub chat: Arc<ChatSession>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl RouterState {
    /// Bundle a controller, chat session, and configuration
    pub fn new(controller: AgentSessionController, chat: ChatSession, config: Config) -> Self {
        Self {
            agents: Arc::new(RwLock::new(controller)),
            chat: Arc::new(chat),
            config: Arc::new(config),
        }
    }
}

/// Re-scope the chat session to the controller's current selection
///
/// Called after every selection change so a conversation never carries over
/// to a different agent.
pub fn sync_chat_binding(controller: &AgentSessionController, chat: &ChatSession) {
    chat.bind(controller.selected().map(|agent| agent.id.as_str()));
}
