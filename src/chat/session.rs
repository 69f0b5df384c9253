//! Chat session
//!
//! In-memory conversation with one agent. At most one request is outstanding
//! at a time: a send that arrives while another is in flight is dropped and
//! reported as `Skipped(RequestInFlight)`, never queued.
//!
//! The session is shared behind an `Arc`; the message list sits in a
//! `std::sync::Mutex` that is never held across the network call.

use crate::chat::client::{AgentConfigPayload, ChatRequest, ChatTransport, WireMessage};
use crate::chat::models::ChatMessage;
use crate::state::{AgentId, AgentRecord};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Number of most recent messages sent with each request
pub const HISTORY_WINDOW: usize = 40;

/// Why a send did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The text was empty or whitespace
    EmptyMessage,
    /// No agent is selected
    NoAgentSelected,
    /// Another request is still outstanding
    RequestInFlight,
    /// The session has been bound to a different agent
    AgentChanged,
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// Informational
    Info,
    /// Something failed
    Error,
}

/// Transient notification for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Short headline
    pub title: String,
    /// Details
    pub description: String,
    /// Severity
    pub kind: NoticeKind,
}

impl Notice {
    /// Informational notice
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind: NoticeKind::Info,
        }
    }

    /// Error notice
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            kind: NoticeKind::Error,
        }
    }
}

/// Result of a `send` call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SendOutcome {
    /// The reply was appended to the session
    Delivered {
        /// The appended assistant message
        reply: ChatMessage,
    },
    /// The request failed; the user message stays in the session
    Failed {
        /// Notice describing the failure
        notice: Notice,
    },
    /// Nothing was sent
    Skipped {
        /// Why the send was ignored
        reason: SkipReason,
    },
    /// A reply arrived after the session was cleared or switched to another agent
    Discarded,
}

#[derive(Debug, Default)]
struct SessionState {
    agent_id: Option<AgentId>,
    messages: Vec<ChatMessage>,
    /// Bumped whenever the conversation is reset
    generation: u64,
    /// Set by an explicit `bind`; from then on only the bound agent may send
    pinned: bool,
}

impl SessionState {
    fn reset(&mut self) {
        self.messages.clear();
        self.generation += 1;
    }

    fn bind(&mut self, agent_id: Option<&str>) {
        if self.agent_id.as_deref() != agent_id {
            self.reset();
            self.agent_id = agent_id.map(str::to_string);
        }
    }
}

/// Releases the in-flight flag on every exit path, including cancellation
struct SendGuard<'a>(&'a AtomicBool);

impl Drop for SendGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Ephemeral message list for one agent conversation
pub struct ChatSession {
    transport: Arc<dyn ChatTransport>,
    state: Mutex<SessionState>,
    sending: AtomicBool,
}

impl ChatSession {
    /// Create an empty session sending through `transport`
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            state: Mutex::new(SessionState::default()),
            sending: AtomicBool::new(false),
        }
    }

    /// Snapshot of the conversation so far
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock_state().messages.clone()
    }

    /// Agent the conversation belongs to
    pub fn agent_id(&self) -> Option<AgentId> {
        self.lock_state().agent_id.clone()
    }

    /// Whether a request is currently outstanding
    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    /// Scope the session to `agent_id`
    /// Switching to a different agent (or to none) discards the conversation.
    /// Once bound, sends for any other agent are skipped until the next `bind`.
    pub fn bind(&self, agent_id: Option<&str>) {
        let mut state = self.lock_state();
        state.pinned = true;
        if state.agent_id.as_deref() != agent_id {
            debug!(
                from = ?state.agent_id,
                to = ?agent_id,
                "Chat session switched agent"
            );
        }
        state.bind(agent_id);
    }

    /// Discard all messages
    pub fn clear(&self) -> Notice {
        self.lock_state().reset();
        Notice::info("Chat Cleared", "Conversation history has been cleared")
    }

    /// Send `text` to `agent` and append the reply
    ///
    /// The request carries the last `HISTORY_WINDOW` messages, including the
    /// new user message, together with the agent's configuration.
    pub async fn send(&self, agent: Option<&AgentRecord>, text: &str) -> SendOutcome {
        let content = text.trim();
        if content.is_empty() {
            return SendOutcome::Skipped {
                reason: SkipReason::EmptyMessage,
            };
        }
        let Some(agent) = agent else {
            return SendOutcome::Skipped {
                reason: SkipReason::NoAgentSelected,
            };
        };
        if self
            .sending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(agent_id = %agent.id, "Dropping send while a request is in flight");
            return SendOutcome::Skipped {
                reason: SkipReason::RequestInFlight,
            };
        }
        let _guard = SendGuard(&self.sending);

        let (request, generation) = {
            let mut state = self.lock_state();
            if state.pinned && state.agent_id.as_deref() != Some(agent.id.as_str()) {
                debug!(
                    agent_id = %agent.id,
                    bound = ?state.agent_id,
                    "Dropping send for an agent the session is not bound to"
                );
                return SendOutcome::Skipped {
                    reason: SkipReason::AgentChanged,
                };
            }
            state.bind(Some(agent.id.as_str()));
            state.messages.push(ChatMessage::user(content));

            let start = state.messages.len().saturating_sub(HISTORY_WINDOW);
            let request = ChatRequest {
                messages: state.messages[start..].iter().map(WireMessage::from).collect(),
                agent_config: AgentConfigPayload::from(agent),
            };
            (request, state.generation)
        };

        info!(
            agent_id = %agent.id,
            history_len = request.messages.len(),
            "Sending chat message"
        );

        let reply = match self.transport.complete(&request).await {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => {
                warn!(agent_id = %agent.id, "Chat endpoint returned an empty reply");
                return SendOutcome::Failed {
                    notice: Notice::error("Chat Error", "The agent returned an empty reply"),
                };
            }
            Err(e) => {
                warn!(agent_id = %agent.id, error = %e, "Chat request failed");
                return SendOutcome::Failed {
                    notice: Notice::error("Chat Error", e.to_string()),
                };
            }
        };

        let mut state = self.lock_state();
        if state.generation != generation {
            debug!(agent_id = %agent.id, "Discarding reply for a reset conversation");
            return SendOutcome::Discarded;
        }
        let message = ChatMessage::assistant(reply);
        state.messages.push(message.clone());
        SendOutcome::Delivered { reply: message }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
