//! Agent Builder Library
//!
//! Agent profile storage, selection tracking, chat sessions, and the embed
//! surface. The server binary is in `src/main.rs`.

pub mod api;
pub mod chat;
pub mod config;
pub mod embed;
pub mod error;
/// Agent records, persistence, and selection tracking
pub mod state;
