//! Prompt School sync layer.
//!
//! Learner identity plus the remote-store boundary. This crate is the only
//! place that knows both the app's camelCase domain naming and the store's
//! snake_case wire naming; everything else sees domain types only.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod client;
mod identity;
mod records;

pub use client::RemoteStore;
pub use identity::load_or_generate;
pub use records::{
    DeviceConfig, DeviceConfigRow, LearningEntry, LearningEntryRow, Profile, ProfileRow,
    PromptRecord, PromptRow, WorkflowRecord, WorkflowRow,
};

/// Errors that can occur during identity handling or remote-store calls.
///
/// Remote failures are logged where they are caught (the client boundary)
/// and surfaced to callers as values of this type; callers converting them
/// into user-facing payloads report a plain `false` and move on. Nothing in
/// this crate retries automatically.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The configured base URL cannot be used to build requests.
    #[error("invalid remote store base URL: '{url}'")]
    InvalidBaseUrl {
        /// The offending URL.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build remote store client: {0}")]
    ClientBuild(reqwest::Error),

    /// A network-level failure (connect, timeout, body read).
    #[error("remote store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("remote store rejected {operation} on '{table}': HTTP {status}")]
    Status {
        /// The operation that failed ("fetch", "delete", "insert", "upsert").
        operation: &'static str,
        /// The table the operation targeted.
        table: &'static str,
        /// The HTTP status code returned.
        status: u16,
    },

    /// The cached identity file exists but cannot be used.
    #[error("unusable identity file '{path}': {message}")]
    Identity {
        /// Path to the identity file.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// General I/O error during identity caching.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// A learner's stable identity, scoping every persisted record.
///
/// Either issued by an authentication backend or generated locally once and
/// cached for the life of the device profile (see [`load_or_generate`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LearnerId(String);

impl LearnerId {
    /// Wraps an identity issued by an external authentication subsystem.
    #[must_use]
    pub fn from_issued(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh local identity.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LearnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_learner_id_generate_is_unique() {
        let a = LearnerId::generate();
        let b = LearnerId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36, "v4 UUID in hyphenated form");
    }

    #[test]
    fn test_learner_id_serializes_transparently() {
        let id = LearnerId::from_issued("learner-123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, r#""learner-123""#);

        let restored: LearnerId = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, id);
    }

    #[test]
    fn test_sync_error_display() {
        let err = SyncError::Status {
            operation: "delete",
            table: "prompts",
            status: 500,
        };
        let msg = err.to_string();
        assert!(msg.contains("delete"));
        assert!(msg.contains("prompts"));
        assert!(msg.contains("500"));
    }
}
