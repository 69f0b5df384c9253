// Agent records
// The persisted agent profile and the editable draft it is built from

use crate::state::store::AgentStore;
use crate::state::timestamp::{self, iso_millis};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an agent
pub type AgentId = String;

/// Temperature used when none is supplied
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Top-p used when none is supplied
pub const DEFAULT_TOP_P: f64 = 1.0;

/// Recommended temperature range (inclusive)
pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);

/// Recommended top-p range (inclusive)
pub const TOP_P_RANGE: (f64, f64) = (0.0, 1.0);

const PREVIEW_CHARS: usize = 120;

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

fn default_top_p() -> f64 {
    DEFAULT_TOP_P
}

/// Agent record
/// A named system prompt plus sampling parameters, as persisted in the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    /// Unique identifier, fixed at creation
    pub id: AgentId,
    /// Display name
    pub name: String,
    /// System prompt sent with every chat request
    pub system_instructions: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Nucleus sampling mass
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Model identifier overriding the endpoint's default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_override: Option<String>,
    /// When the record was first saved
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    /// When the record was last saved
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl AgentRecord {
    /// Short summary of the system instructions for list views
    pub fn instructions_preview(&self) -> String {
        if self.system_instructions.chars().count() > PREVIEW_CHARS {
            let head: String = self.system_instructions.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.system_instructions.clone()
        }
    }
}

/// Editable agent form data
///
/// A draft without an `id` creates a new agent when built; a draft carrying
/// the id of an existing record edits that record in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentDraft {
    /// Id of the record being edited, if any
    #[serde(default)]
    pub id: Option<AgentId>,
    /// Display name (trimmed on build)
    #[serde(default)]
    pub name: String,
    /// System prompt (trimmed on build)
    #[serde(default)]
    pub system_instructions: String,
    /// Sampling temperature, defaults to 0.7
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Nucleus sampling mass, defaults to 1
    #[serde(default)]
    pub top_p: Option<f64>,
    /// Optional model override; blank means none
    #[serde(default)]
    pub model_override: Option<String>,
}

impl AgentDraft {
    /// Create a draft for a new agent
    pub fn new(name: impl Into<String>, system_instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_instructions: system_instructions.into(),
            ..Default::default()
        }
    }

    /// Create a draft pre-filled from an existing record
    pub fn from_record(record: &AgentRecord) -> Self {
        Self {
            id: Some(record.id.clone()),
            name: record.name.clone(),
            system_instructions: record.system_instructions.clone(),
            temperature: Some(record.temperature),
            top_p: Some(record.top_p),
            model_override: record.model_override.clone(),
        }
    }

    /// Validate the draft
    /// Returns Ok(()) if valid, Err with a user-facing message if invalid
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Agent name is required.".to_string());
        }
        if self.system_instructions.trim().is_empty() {
            return Err("System instructions are required.".to_string());
        }
        if let Some(temperature) = self.temperature {
            check_range("Temperature", temperature, TEMPERATURE_RANGE)?;
        }
        if let Some(top_p) = self.top_p {
            check_range("Top P", top_p, TOP_P_RANGE)?;
        }
        Ok(())
    }

    /// Build the record to persist
    ///
    /// `existing` is the stored record with the draft's id, if there is one;
    /// its `created_at` is carried over. `updated_at` is always now.
    pub fn build(&self, existing: Option<&AgentRecord>) -> Result<AgentRecord, String> {
        self.validate()?;

        let now = timestamp::now();
        let id = self
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(AgentStore::generate_id);

        Ok(AgentRecord {
            id,
            name: self.name.trim().to_string(),
            system_instructions: self.system_instructions.trim().to_string(),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            top_p: self.top_p.unwrap_or(DEFAULT_TOP_P),
            model_override: self
                .model_override
                .as_deref()
                .map(str::trim)
                .filter(|model| !model.is_empty())
                .map(str::to_string),
            created_at: existing.map(|record| record.created_at).unwrap_or(now),
            updated_at: now,
        })
    }
}

fn check_range(label: &str, value: f64, (min, max): (f64, f64)) -> Result<(), String> {
    if !value.is_finite() || value < min || value > max {
        return Err(format!("{} must be between {} and {}.", label, min, max));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_new_agent_applies_defaults() {
        let draft = AgentDraft::new("  Helper ", " Be concise\n");
        let record = draft.build(None).unwrap();

        assert!(record.id.starts_with("agent_"));
        assert_eq!(record.name, "Helper");
        assert_eq!(record.system_instructions, "Be concise");
        assert_eq!(record.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(record.top_p, DEFAULT_TOP_P);
        assert!(record.model_override.is_none());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_build_keeps_zero_temperature() {
        let mut draft = AgentDraft::new("Deterministic", "Answer exactly");
        draft.temperature = Some(0.0);
        let record = draft.build(None).unwrap();
        assert_eq!(record.temperature, 0.0);
    }

    #[test]
    fn test_build_edit_preserves_id_and_created_at() {
        let original = AgentDraft::new("Helper", "Be concise").build(None).unwrap();

        let mut draft = AgentDraft::from_record(&original);
        draft.name = "Helper v2".to_string();
        let edited = draft.build(Some(&original)).unwrap();

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.created_at, original.created_at);
        assert!(edited.updated_at >= original.updated_at);
        assert_eq!(edited.name, "Helper v2");
    }

    #[test]
    fn test_blank_model_override_is_absent() {
        let mut draft = AgentDraft::new("Helper", "Be concise");
        draft.model_override = Some("   ".to_string());
        assert!(draft.build(None).unwrap().model_override.is_none());

        draft.model_override = Some(" gpt-4o ".to_string());
        assert_eq!(
            draft.build(None).unwrap().model_override.as_deref(),
            Some("gpt-4o")
        );
    }

    #[test]
    fn test_validate_required_fields() {
        assert_eq!(
            AgentDraft::new("  ", "Be concise").validate(),
            Err("Agent name is required.".to_string())
        );
        assert_eq!(
            AgentDraft::new("Helper", "\t").validate(),
            Err("System instructions are required.".to_string())
        );
        assert!(AgentDraft::new("Helper", "Be concise").validate().is_ok());
    }

    #[test]
    fn test_validate_ranges() {
        let mut draft = AgentDraft::new("Helper", "Be concise");
        draft.temperature = Some(2.5);
        assert!(draft.validate().is_err());

        draft.temperature = Some(2.0);
        draft.top_p = Some(1.2);
        assert!(draft.validate().is_err());

        draft.top_p = Some(f64::NAN);
        assert!(draft.validate().is_err());

        draft.top_p = Some(0.0);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_record_json_shape() {
        let mut record = AgentDraft::new("Helper", "Be concise").build(None).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("systemInstructions").is_some());
        assert!(json.get("topP").is_some());
        assert!(json.get("modelOverride").is_none());
        assert!(json["createdAt"].as_str().unwrap().ends_with('Z'));

        record.model_override = Some("gpt-4o".to_string());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["modelOverride"], "gpt-4o");
    }

    #[test]
    fn test_record_defaults_when_sampling_fields_missing() {
        let json = r#"{
            "id": "agent_1_abc",
            "name": "Legacy",
            "systemInstructions": "Old prompt",
            "createdAt": "2024-01-01T00:00:00.000Z",
            "updatedAt": "2024-01-01T00:00:00.000Z"
        }"#;
        let record: AgentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(record.top_p, DEFAULT_TOP_P);
    }

    #[test]
    fn test_instructions_preview() {
        let mut record = AgentDraft::new("Helper", "Short").build(None).unwrap();
        assert_eq!(record.instructions_preview(), "Short");

        record.system_instructions = "x".repeat(130);
        let preview = record.instructions_preview();
        assert_eq!(preview.len(), 123);
        assert!(preview.ends_with("..."));
    }
}
