//! Chat module
//!
//! Holds the in-memory chat session and the client for the completion endpoint.

pub mod client;
pub mod models;
pub mod session;

pub use client::{ChatError, ChatRequest, ChatTransport, HttpChatClient};
pub use models::{ChatMessage, MessageRole};
pub use session::{ChatSession, Notice, NoticeKind, SendOutcome, SkipReason, HISTORY_WINDOW};
