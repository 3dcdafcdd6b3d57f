//! HTTP client for the remote relational store.
//!
//! The store speaks a PostgREST-style REST dialect: one endpoint per table,
//! filters as query parameters, API key in headers. [`RemoteStore`] is the
//! boundary where network failures are caught and logged; everything above
//! it sees typed [`SyncError`]s and decides its own messaging.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::records::{
    DeviceConfig, DeviceConfigRow, LearningEntry, LearningEntryRow, Profile, ProfileRow,
    PromptRecord, PromptRow, WorkflowRecord, WorkflowRow,
};
use crate::{LearnerId, Result, SyncError};

const USER_PROFILES: &str = "user_profiles";
const LEARNING_ENTRIES: &str = "learning_entries";
const WORKFLOWS: &str = "workflows";
const PROMPTS: &str = "prompts";
const DEVICE_CONFIGURATIONS: &str = "device_configurations";

/// Typed client for the remote store.
///
/// Collections use replace-all semantics; singletons use keyed upserts.
/// Replace-all is unsafe under concurrent writers for the same learner;
/// callers must not issue overlapping writes for one entity. This is a
/// documented limitation, not a guarantee the client can enforce.
#[derive(Debug, Clone)]
pub struct RemoteStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteStore {
    /// Creates a client for the store at `base_url`.
    ///
    /// The timeout bounds every request. The reference contract specifies no
    /// deadline; this is defensive engineering against a hung store.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidBaseUrl`] for a non-http(s) URL and
    /// [`SyncError::ClientBuild`] if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SyncError::InvalidBaseUrl { url: base_url });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SyncError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    // ------------------------------------------------------------------------
    // Row-level helpers
    // ------------------------------------------------------------------------

    /// Fetches all rows scoped to a learner, newest first.
    ///
    /// Zero rows and HTTP 404 both mean "nothing stored yet" and yield an
    /// empty vector, never an error.
    async fn fetch_rows<R: DeserializeOwned>(
        &self,
        table: &'static str,
        learner: &LearnerId,
    ) -> Result<Vec<R>> {
        let response = self
            .http
            .get(self.endpoint(table))
            .query(&[
                ("learner_id", format!("eq.{learner}")),
                ("order", "updated_at.desc".to_string()),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Self::log_network("fetch", table, e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        Self::check_status("fetch", table, response.status())?;

        Ok(response.json().await?)
    }

    /// Deletes every row scoped to a learner.
    async fn delete_rows(&self, table: &'static str, learner: &LearnerId) -> Result<()> {
        let response = self
            .http
            .delete(self.endpoint(table))
            .query(&[("learner_id", format!("eq.{learner}"))])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Self::log_network("delete", table, e))?;

        // Deleting from a not-yet-created table removes nothing, which is fine.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check_status("delete", table, response.status())
    }

    /// Inserts rows. Empty input is a no-op.
    async fn insert_rows<R: Serialize>(&self, table: &'static str, rows: &[R]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let response = self
            .http
            .post(self.endpoint(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(rows)
            .send()
            .await
            .map_err(|e| Self::log_network("insert", table, e))?;

        Self::check_status("insert", table, response.status())
    }

    /// Upserts one row keyed on the learner scope column.
    async fn upsert_row<R: Serialize>(&self, table: &'static str, row: &R) -> Result<()> {
        let response = self
            .http
            .post(self.endpoint(table))
            .query(&[("on_conflict", "learner_id")])
            .header("apikey", &self.api_key)
            .header("Prefer", "resolution=merge-duplicates")
            .bearer_auth(&self.api_key)
            .json(&[row])
            .send()
            .await
            .map_err(|e| Self::log_network("upsert", table, e))?;

        Self::check_status("upsert", table, response.status())
    }

    fn check_status(
        operation: &'static str,
        table: &'static str,
        status: StatusCode,
    ) -> Result<()> {
        if status.is_success() {
            return Ok(());
        }
        tracing::error!(
            operation,
            table,
            status = status.as_u16(),
            "remote store rejected request"
        );
        Err(SyncError::Status {
            operation,
            table,
            status: status.as_u16(),
        })
    }

    fn log_network(
        operation: &'static str,
        table: &'static str,
        error: reqwest::Error,
    ) -> SyncError {
        tracing::error!(operation, table, error = %error, "remote store request failed");
        SyncError::Http(error)
    }

    // ------------------------------------------------------------------------
    // Profile (singleton)
    // ------------------------------------------------------------------------

    /// Fetches the learner's profile, if one exists.
    pub async fn fetch_profile(&self, learner: &LearnerId) -> Result<Option<Profile>> {
        let rows: Vec<ProfileRow> = self.fetch_rows(USER_PROFILES, learner).await?;
        Ok(rows.into_iter().next().map(ProfileRow::into_domain))
    }

    /// Creates or overwrites the learner's profile, all fields.
    pub async fn upsert_profile(&self, learner: &LearnerId, profile: &Profile) -> Result<()> {
        let row = ProfileRow::from_domain(learner, profile);
        self.upsert_row(USER_PROFILES, &row).await
    }

    // ------------------------------------------------------------------------
    // Learning entries (collection)
    // ------------------------------------------------------------------------

    /// Fetches all learning entries for a learner, newest first.
    pub async fn fetch_learning_entries(&self, learner: &LearnerId) -> Result<Vec<LearningEntry>> {
        let rows: Vec<LearningEntryRow> = self.fetch_rows(LEARNING_ENTRIES, learner).await?;
        Ok(rows.into_iter().map(LearningEntryRow::into_domain).collect())
    }

    /// Replaces the learner's learning entries with the given list.
    ///
    /// Delete-then-insert: a failed delete aborts the call before any insert,
    /// so a partial replace never happens.
    pub async fn replace_learning_entries(
        &self,
        learner: &LearnerId,
        entries: &[LearningEntry],
    ) -> Result<()> {
        let rows: Vec<LearningEntryRow> = entries
            .iter()
            .map(|e| LearningEntryRow::from_domain(learner, e))
            .collect();
        self.delete_rows(LEARNING_ENTRIES, learner).await?;
        self.insert_rows(LEARNING_ENTRIES, &rows).await
    }

    // ------------------------------------------------------------------------
    // Workflows (collection)
    // ------------------------------------------------------------------------

    /// Fetches all saved workflows for a learner, newest first.
    pub async fn fetch_workflows(&self, learner: &LearnerId) -> Result<Vec<WorkflowRecord>> {
        let rows: Vec<WorkflowRow> = self.fetch_rows(WORKFLOWS, learner).await?;
        Ok(rows.into_iter().map(WorkflowRow::into_domain).collect())
    }

    /// Replaces the learner's workflows with the given list.
    pub async fn replace_workflows(
        &self,
        learner: &LearnerId,
        workflows: &[WorkflowRecord],
    ) -> Result<()> {
        let rows: Vec<WorkflowRow> = workflows
            .iter()
            .map(|w| WorkflowRow::from_domain(learner, w))
            .collect();
        self.delete_rows(WORKFLOWS, learner).await?;
        self.insert_rows(WORKFLOWS, &rows).await
    }

    // ------------------------------------------------------------------------
    // Prompts (collection)
    // ------------------------------------------------------------------------

    /// Fetches all saved prompts for a learner, newest first.
    pub async fn fetch_prompts(&self, learner: &LearnerId) -> Result<Vec<PromptRecord>> {
        let rows: Vec<PromptRow> = self.fetch_rows(PROMPTS, learner).await?;
        Ok(rows.into_iter().map(PromptRow::into_domain).collect())
    }

    /// Replaces the learner's prompt library with the given list.
    pub async fn replace_prompts(
        &self,
        learner: &LearnerId,
        prompts: &[PromptRecord],
    ) -> Result<()> {
        let rows: Vec<PromptRow> = prompts
            .iter()
            .map(|p| PromptRow::from_domain(learner, p))
            .collect();
        self.delete_rows(PROMPTS, learner).await?;
        self.insert_rows(PROMPTS, &rows).await
    }

    // ------------------------------------------------------------------------
    // Device configuration (singleton)
    // ------------------------------------------------------------------------

    /// Fetches the learner's device configuration, if one exists.
    pub async fn fetch_device_config(&self, learner: &LearnerId) -> Result<Option<DeviceConfig>> {
        let rows: Vec<DeviceConfigRow> = self.fetch_rows(DEVICE_CONFIGURATIONS, learner).await?;
        Ok(rows.into_iter().next().map(DeviceConfigRow::into_domain))
    }

    /// Creates or overwrites the learner's device configuration, all fields.
    pub async fn upsert_device_config(
        &self,
        learner: &LearnerId,
        config: &DeviceConfig,
    ) -> Result<()> {
        let row = DeviceConfigRow::from_domain(learner, config);
        self.upsert_row(DEVICE_CONFIGURATIONS, &row).await
    }
}
