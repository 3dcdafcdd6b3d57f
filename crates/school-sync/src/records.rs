//! Domain records and their wire rows.
//!
//! Domain types serialize camelCase for the app surface. Wire rows mirror
//! the store's table columns in snake_case and carry the `learner_id` scope
//! column. The conversions in this module are the sole translation boundary
//! between the two namings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::LearnerId;

// ============================================================================
// Profile (singleton per learner, table `user_profiles`)
// ============================================================================

/// The learner's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Record identifier.
    pub id: String,
    /// Name shown on the dashboard.
    pub display_name: String,
    /// Contact address, if the learner supplied one.
    pub email: Option<String>,
    /// Free-form bio.
    pub bio: Option<String>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the `user_profiles` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    /// Record identifier.
    pub id: String,
    /// Owning learner.
    pub learner_id: String,
    /// Name shown on the dashboard.
    pub display_name: String,
    /// Contact address.
    pub email: Option<String>,
    /// Free-form bio.
    pub bio: Option<String>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl ProfileRow {
    /// Builds a row scoped to the given learner.
    #[must_use]
    pub fn from_domain(learner: &LearnerId, profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            learner_id: learner.as_str().to_string(),
            display_name: profile.display_name.clone(),
            email: profile.email.clone(),
            bio: profile.bio.clone(),
            updated_at: profile.updated_at,
        }
    }

    /// Strips the scope column, returning the domain record.
    #[must_use]
    pub fn into_domain(self) -> Profile {
        Profile {
            id: self.id,
            display_name: self.display_name,
            email: self.email,
            bio: self.bio,
            updated_at: self.updated_at,
        }
    }
}

// ============================================================================
// LearningEntry (collection, table `learning_entries`)
// ============================================================================

/// A journal entry in the learner's learning log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningEntry {
    /// Record identifier.
    pub id: String,
    /// Entry title.
    pub title: String,
    /// The notes themselves.
    pub notes: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the `learning_entries` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningEntryRow {
    /// Record identifier.
    pub id: String,
    /// Owning learner.
    pub learner_id: String,
    /// Entry title.
    pub title: String,
    /// The notes themselves.
    pub notes: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl LearningEntryRow {
    /// Builds a row scoped to the given learner.
    #[must_use]
    pub fn from_domain(learner: &LearnerId, entry: &LearningEntry) -> Self {
        Self {
            id: entry.id.clone(),
            learner_id: learner.as_str().to_string(),
            title: entry.title.clone(),
            notes: entry.notes.clone(),
            tags: entry.tags.clone(),
            updated_at: entry.updated_at,
        }
    }

    /// Strips the scope column, returning the domain record.
    #[must_use]
    pub fn into_domain(self) -> LearningEntry {
        LearningEntry {
            id: self.id,
            title: self.title,
            notes: self.notes,
            tags: self.tags,
            updated_at: self.updated_at,
        }
    }
}

// ============================================================================
// WorkflowRecord (collection, table `workflows`)
// ============================================================================

/// A saved flow-designer graph.
///
/// The graph itself is opaque to the sync layer; it round-trips as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRecord {
    /// Record identifier.
    pub id: String,
    /// Workflow name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// The designer's node/edge graph, as produced by the designer.
    pub definition: serde_json::Value,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the `workflows` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRow {
    /// Record identifier.
    pub id: String,
    /// Owning learner.
    pub learner_id: String,
    /// Workflow name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// The designer's node/edge graph.
    pub definition: serde_json::Value,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl WorkflowRow {
    /// Builds a row scoped to the given learner.
    #[must_use]
    pub fn from_domain(learner: &LearnerId, workflow: &WorkflowRecord) -> Self {
        Self {
            id: workflow.id.clone(),
            learner_id: learner.as_str().to_string(),
            name: workflow.name.clone(),
            description: workflow.description.clone(),
            definition: workflow.definition.clone(),
            updated_at: workflow.updated_at,
        }
    }

    /// Strips the scope column, returning the domain record.
    #[must_use]
    pub fn into_domain(self) -> WorkflowRecord {
        WorkflowRecord {
            id: self.id,
            name: self.name,
            description: self.description,
            definition: self.definition,
            updated_at: self.updated_at,
        }
    }
}

// ============================================================================
// PromptRecord (collection, table `prompts`)
// ============================================================================

/// A prompt the learner saved to their library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRecord {
    /// Record identifier.
    pub id: String,
    /// Prompt title.
    pub title: String,
    /// The prompt text.
    pub body: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the `prompts` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRow {
    /// Record identifier.
    pub id: String,
    /// Owning learner.
    pub learner_id: String,
    /// Prompt title.
    pub title: String,
    /// The prompt text.
    pub body: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl PromptRow {
    /// Builds a row scoped to the given learner.
    #[must_use]
    pub fn from_domain(learner: &LearnerId, prompt: &PromptRecord) -> Self {
        Self {
            id: prompt.id.clone(),
            learner_id: learner.as_str().to_string(),
            title: prompt.title.clone(),
            body: prompt.body.clone(),
            tags: prompt.tags.clone(),
            updated_at: prompt.updated_at,
        }
    }

    /// Strips the scope column, returning the domain record.
    #[must_use]
    pub fn into_domain(self) -> PromptRecord {
        PromptRecord {
            id: self.id,
            title: self.title,
            body: self.body,
            tags: self.tags,
            updated_at: self.updated_at,
        }
    }
}

// ============================================================================
// DeviceConfig (singleton per learner, table `device_configurations`)
// ============================================================================

/// Per-device preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    /// Record identifier.
    pub id: String,
    /// UI theme name.
    pub theme: String,
    /// Editor font size in points.
    pub editor_font_size: u32,
    /// Whether the learner opted into usage telemetry.
    pub telemetry_opt_in: bool,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the `device_configurations` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfigRow {
    /// Record identifier.
    pub id: String,
    /// Owning learner.
    pub learner_id: String,
    /// UI theme name.
    pub theme: String,
    /// Editor font size in points.
    pub editor_font_size: u32,
    /// Whether the learner opted into usage telemetry.
    pub telemetry_opt_in: bool,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl DeviceConfigRow {
    /// Builds a row scoped to the given learner.
    #[must_use]
    pub fn from_domain(learner: &LearnerId, config: &DeviceConfig) -> Self {
        Self {
            id: config.id.clone(),
            learner_id: learner.as_str().to_string(),
            theme: config.theme.clone(),
            editor_font_size: config.editor_font_size,
            telemetry_opt_in: config.telemetry_opt_in,
            updated_at: config.updated_at,
        }
    }

    /// Strips the scope column, returning the domain record.
    #[must_use]
    pub fn into_domain(self) -> DeviceConfig {
        DeviceConfig {
            id: self.id,
            theme: self.theme,
            editor_font_size: self.editor_font_size,
            telemetry_opt_in: self.telemetry_opt_in,
            updated_at: self.updated_at,
        }
    }
}
