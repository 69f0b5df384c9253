//! Agent store
//!
//! Durable list of agent records kept as one JSON array under a single
//! storage key. Every mutation rewrites the whole array.
//!
//! Reads never fail: a missing slot is an empty list, and unreadable or
//! malformed content is logged and treated as empty. Array entries that do
//! not decode as agents are skipped on read but kept verbatim on write, so a
//! legacy or hand-edited entry never takes the valid ones down with it.
//! Writes log failures and also return them so callers can decide whether to
//! warn or retry.

use crate::state::agent::{AgentId, AgentRecord};
use crate::state::persistence::{KeyValueStore, PersistenceError};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Storage key holding the serialized agent list
pub const AGENTS_STORAGE_KEY: &str = "ai_agents";

const ID_SUFFIX_LEN: usize = 9;

/// Agent persistence operations
#[derive(Clone)]
pub struct AgentStore {
    backend: Arc<dyn KeyValueStore>,
}

impl AgentStore {
    /// Create a store over the given persistence handle
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Load all agents in insertion order
    ///
    /// Returns an empty list when the slot is missing or cannot be parsed.
    pub fn get_all(&self) -> Vec<AgentRecord> {
        match self.read_entries() {
            Ok(entries) => decode_entries(entries),
            Err(e) => {
                error!(
                    key = AGENTS_STORAGE_KEY,
                    error = %e,
                    "Error reading agents from storage"
                );
                Vec::new()
            }
        }
    }

    /// Find an agent by ID
    pub fn get_by_id(&self, id: &str) -> Option<AgentRecord> {
        self.get_all().into_iter().find(|agent| agent.id == id)
    }

    /// Insert or replace an agent
    ///
    /// An existing record with the same id is replaced at its position;
    /// otherwise the record is appended.
    pub fn save(&self, agent: &AgentRecord) -> Result<(), PersistenceError> {
        let mut entries = self.entries_for_write()?;
        let value =
            serde_json::to_value(agent).map_err(|e| PersistenceError::JsonError(e.to_string()))?;
        match entries.iter().position(|entry| entry_id(entry) == Some(agent.id.as_str())) {
            Some(index) => entries[index] = value,
            None => entries.push(value),
        }

        self.write_entries(&entries).map_err(|e| {
            error!(agent_id = %agent.id, error = %e, "Error saving agent to storage");
            e
        })?;

        debug!(agent_id = %agent.id, count = entries.len(), "Saved agent");
        Ok(())
    }

    /// Remove an agent
    /// Removing an unknown id leaves the list unchanged and is not an error
    pub fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        let mut entries = self.entries_for_write()?;
        entries.retain(|entry| entry_id(entry) != Some(id));

        self.write_entries(&entries).map_err(|e| {
            error!(agent_id = %id, error = %e, "Error deleting agent from storage");
            e
        })?;

        debug!(agent_id = %id, count = entries.len(), "Deleted agent");
        Ok(())
    }

    /// Generate a new agent ID
    ///
    /// Combines the current time in milliseconds with a random suffix:
    /// `agent_1717171717171_3f9a0c2b1`.
    pub fn generate_id() -> AgentId {
        generate_prefixed_id("agent")
    }

    fn read_entries(&self) -> Result<Vec<Value>, PersistenceError> {
        let Some(raw) = self.backend.get(AGENTS_STORAGE_KEY)? else {
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        match serde_json::from_str(&raw) {
            Ok(Value::Array(entries)) => Ok(entries),
            Ok(_) => Err(PersistenceError::InvalidData(
                "agent list is not a JSON array".to_string(),
            )),
            Err(e) => Err(PersistenceError::JsonError(e.to_string())),
        }
    }

    /// Current entries as the base for a rewrite
    ///
    /// Backend failures abort the write. Content that is not a JSON array is
    /// logged and replaced by a fresh list.
    fn entries_for_write(&self) -> Result<Vec<Value>, PersistenceError> {
        match self.read_entries() {
            Ok(entries) => Ok(entries),
            Err(e @ PersistenceError::IoError(_)) => {
                error!(key = AGENTS_STORAGE_KEY, error = %e, "Error reading agents before write");
                Err(e)
            }
            Err(e) => {
                warn!(
                    key = AGENTS_STORAGE_KEY,
                    error = %e,
                    "Replacing malformed agent list"
                );
                Ok(Vec::new())
            }
        }
    }

    fn write_entries(&self, entries: &[Value]) -> Result<(), PersistenceError> {
        let json =
            serde_json::to_string(entries).map_err(|e| PersistenceError::JsonError(e.to_string()))?;
        self.backend.set(AGENTS_STORAGE_KEY, &json)
    }
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

fn decode_entries(entries: Vec<Value>) -> Vec<AgentRecord> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let id = entry_id(&entry).map(str::to_string);
            match serde_json::from_value(entry) {
                Ok(agent) => Some(agent),
                Err(e) => {
                    warn!(index, agent_id = ?id, error = %e, "Skipping unreadable agent entry");
                    None
                }
            }
        })
        .collect()
}

/// `<prefix>_<unix millis>_<random suffix>`
pub(crate) fn generate_prefixed_id(prefix: &str) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(ID_SUFFIX_LEN)
        .collect();
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), suffix)
}
