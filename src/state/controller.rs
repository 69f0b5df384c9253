// Agent session controller
// Keeps the loaded agent list and the current selection in step with the store

use crate::error::AppError;
use crate::state::agent::{AgentDraft, AgentRecord};
use crate::state::store::AgentStore;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Controller shared between request handlers
pub type SharedController = Arc<RwLock<AgentSessionController>>;

/// Loaded agents plus the selected agent
///
/// After every mutation the list is reloaded from the store and the selection
/// is re-resolved against it, so a selection never outlives its record.
pub struct AgentSessionController {
    store: AgentStore,
    agents: Vec<AgentRecord>,
    selected: Option<AgentRecord>,
}

impl AgentSessionController {
    /// Create a controller over `store`
    /// Nothing is loaded until `load` is called
    pub fn new(store: AgentStore) -> Self {
        Self {
            store,
            agents: Vec::new(),
            selected: None,
        }
    }

    /// Underlying store
    pub fn store(&self) -> &AgentStore {
        &self.store
    }

    /// Agents as of the last load, in insertion order
    pub fn agents(&self) -> &[AgentRecord] {
        &self.agents
    }

    /// Get the number of loaded agents
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Get a reference to the selected agent, if any
    pub fn selected(&self) -> Option<&AgentRecord> {
        self.selected.as_ref()
    }

    /// Reload all agents from the store
    ///
    /// A previous selection is replaced by its freshly loaded record, or
    /// cleared if the record no longer exists.
    pub fn load(&mut self) {
        self.agents = self.store.get_all();

        if let Some(previous) = self.selected.take() {
            self.selected = self
                .agents
                .iter()
                .find(|agent| agent.id == previous.id)
                .cloned();
            if self.selected.is_none() {
                debug!(agent_id = %previous.id, "Selected agent no longer exists");
            }
        }
    }

    /// Select a loaded agent by ID
    /// Returns the selected agent, or `None` (selection unchanged) if unknown
    pub fn select(&mut self, id: &str) -> Option<&AgentRecord> {
        let agent = self.agents.iter().find(|agent| agent.id == id)?.clone();
        self.selected = Some(agent);
        self.selected.as_ref()
    }

    /// Deselect the current agent
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Reload after a save and select the saved record
    pub fn on_saved(&mut self, record: AgentRecord) {
        self.load();
        self.selected = Some(record);
    }

    /// Reload after a delete
    /// Clears the selection if it pointed at the deleted agent
    pub fn on_deleted(&mut self, id: &str) {
        self.load();
        if self.selected.as_ref().is_some_and(|agent| agent.id == id) {
            self.selected = None;
        }
    }

    /// Validate a draft, persist the resulting record, and select it
    ///
    /// Validation failures abort before anything is written.
    pub fn save_draft(&mut self, draft: &AgentDraft) -> Result<AgentRecord, AppError> {
        draft.validate().map_err(AppError::InvalidAgentConfig)?;

        let existing = draft.id.as_deref().and_then(|id| self.store.get_by_id(id));
        let record = draft
            .build(existing.as_ref())
            .map_err(AppError::InvalidAgentConfig)?;

        self.store.save(&record).map_err(|e| {
            warn!(agent_id = %record.id, error = %e, "Agent was not persisted");
            AppError::from(e)
        })?;

        info!(
            agent_id = %record.id,
            agent_name = %record.name,
            created = existing.is_none(),
            "Agent saved"
        );
        self.on_saved(record.clone());
        Ok(record)
    }

    /// Delete an agent from the store and reload
    pub fn delete(&mut self, id: &str) -> Result<(), AppError> {
        self.store.delete(id)?;
        info!(agent_id = %id, "Agent deleted");
        self.on_deleted(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::persistence::{KeyValueStore, MemoryStore, PersistenceError};

    fn create_test_controller() -> AgentSessionController {
        AgentSessionController::new(AgentStore::new(Arc::new(MemoryStore::new())))
    }

    fn draft(name: &str) -> AgentDraft {
        AgentDraft::new(name, "Be concise")
    }

    #[test]
    fn test_controller_creation() {
        let controller = create_test_controller();
        assert_eq!(controller.agent_count(), 0);
        assert!(controller.selected().is_none());
    }

    #[test]
    fn test_save_draft_loads_and_selects() {
        let mut controller = create_test_controller();
        let record = controller.save_draft(&draft("Helper")).unwrap();

        assert_eq!(controller.agent_count(), 1);
        assert_eq!(controller.selected(), Some(&record));
    }

    #[test]
    fn test_save_draft_validation_leaves_state_unchanged() {
        let mut controller = create_test_controller();
        let saved = controller.save_draft(&draft("Helper")).unwrap();

        let result = controller.save_draft(&AgentDraft::new("", "Be concise"));
        assert!(matches!(result, Err(AppError::InvalidAgentConfig(_))));
        assert_eq!(controller.agent_count(), 1);
        assert_eq!(controller.selected(), Some(&saved));
        assert_eq!(controller.store().get_all().len(), 1);
    }

    #[test]
    fn test_edit_refreshes_selection() {
        let mut controller = create_test_controller();
        let original = controller.save_draft(&draft("Helper")).unwrap();

        let mut edit = AgentDraft::from_record(&original);
        edit.temperature = Some(1.3);
        let edited = controller.save_draft(&edit).unwrap();

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.created_at, original.created_at);
        assert_eq!(controller.agent_count(), 1);
        assert_eq!(controller.selected().unwrap().temperature, 1.3);
    }

    #[test]
    fn test_load_picks_up_external_edits() {
        let mut controller = create_test_controller();
        let mut record = controller.save_draft(&draft("Helper")).unwrap();

        record.name = "Renamed elsewhere".to_string();
        controller.store().save(&record).unwrap();
        controller.load();

        assert_eq!(controller.selected().unwrap().name, "Renamed elsewhere");
    }

    #[test]
    fn test_on_deleted_clears_selection() {
        let mut controller = create_test_controller();
        let record = controller.save_draft(&draft("Helper")).unwrap();

        controller.delete(&record.id).unwrap();
        assert!(controller.selected().is_none());

        controller.load();
        assert!(controller.selected().is_none());
        assert_eq!(controller.agent_count(), 0);
    }

    #[test]
    fn test_deleting_other_agent_keeps_selection() {
        let mut controller = create_test_controller();
        let other = controller.save_draft(&draft("Other")).unwrap();
        let selected = controller.save_draft(&draft("Selected")).unwrap();

        controller.delete(&other.id).unwrap();
        assert_eq!(controller.selected(), Some(&selected));
        assert_eq!(controller.agent_count(), 1);
    }

    #[test]
    fn test_load_drops_selection_removed_elsewhere() {
        let mut controller = create_test_controller();
        let record = controller.save_draft(&draft("Helper")).unwrap();

        controller.store().delete(&record.id).unwrap();
        controller.load();
        assert!(controller.selected().is_none());
    }

    #[test]
    fn test_select_unknown_agent() {
        let mut controller = create_test_controller();
        let record = controller.save_draft(&draft("Helper")).unwrap();
        controller.clear_selection();

        assert!(controller.select("agent_0_missing").is_none());
        assert!(controller.selected().is_none());

        assert_eq!(controller.select(&record.id), Some(&record));
    }

    #[test]
    fn test_save_failure_is_reported_and_not_selected() {
        struct FailingStore;

        impl KeyValueStore for FailingStore {
            fn get(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
                Ok(None)
            }

            fn set(&self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
                Err(PersistenceError::IoError("read-only filesystem".to_string()))
            }

            fn remove(&self, _key: &str) -> Result<(), PersistenceError> {
                Ok(())
            }
        }

        let mut controller = AgentSessionController::new(AgentStore::new(Arc::new(FailingStore)));
        let result = controller.save_draft(&draft("Helper"));

        assert!(matches!(result, Err(AppError::Persistence(_))));
        assert!(controller.selected().is_none());
    }
}
