// State management module
// Handles agent records, the persisted agent store, and selection tracking

pub mod agent;
pub mod controller;
pub mod persistence;
pub mod store;
pub mod timestamp;

pub use agent::{AgentDraft, AgentId, AgentRecord, DEFAULT_TEMPERATURE, DEFAULT_TOP_P};
pub use controller::{AgentSessionController, SharedController};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, PersistenceError};
pub use store::{AgentStore, AGENTS_STORAGE_KEY};
