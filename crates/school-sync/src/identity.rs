//! Learner identity caching.
//!
//! When no authentication subsystem supplies an identity, the app generates
//! one locally, once, and caches it in a small JSON file for the life of
//! the device profile. Every persisted record is scoped to this identity.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{LearnerId, Result, SyncError};

/// On-disk shape of the cached identity.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityRecord {
    learner_id: LearnerId,
}

/// Loads the cached learner identity, generating and caching one if absent.
///
/// A missing file is the normal first-run case. An unreadable or empty file
/// is an error rather than a silent regeneration: regenerating would orphan
/// every record scoped to the previous identity.
///
/// # Errors
///
/// Returns [`SyncError::Identity`] when the file exists but cannot be
/// parsed, and I/O errors when the cache cannot be written.
pub fn load_or_generate(path: &Path) -> Result<LearnerId> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let record: IdentityRecord =
                serde_json::from_str(&contents).map_err(|e| SyncError::Identity {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
            if record.learner_id.as_str().trim().is_empty() {
                return Err(SyncError::Identity {
                    path: path.to_path_buf(),
                    message: "cached learner id is empty".to_string(),
                });
            }
            tracing::debug!(learner = %record.learner_id, "loaded cached learner identity");
            Ok(record.learner_id)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            let learner_id = LearnerId::generate();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(&IdentityRecord {
                learner_id: learner_id.clone(),
            })?;
            std::fs::write(path, contents)?;
            tracing::info!(learner = %learner_id, "generated and cached new learner identity");
            Ok(learner_id)
        }
        Err(e) => Err(SyncError::Io(e)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("school_identity_{name}"))
    }

    #[test]
    fn test_generates_and_caches_on_first_run() {
        let dir = temp_path("first_run");
        std::fs::remove_dir_all(&dir).ok();
        let path = dir.join("learner.json");

        let first = load_or_generate(&path).unwrap();
        assert!(path.exists(), "identity must be cached to disk");

        // A second call returns the same identity, not a new one.
        let second = load_or_generate(&path).unwrap();
        assert_eq!(first, second);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reads_existing_identity() {
        let dir = temp_path("existing");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("learner.json");
        std::fs::write(&path, r#"{"learnerId": "learner-from-backend"}"#).unwrap();

        let id = load_or_generate(&path).unwrap();
        assert_eq!(id.as_str(), "learner-from-backend");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_identity_file_is_an_error_not_a_regeneration() {
        let dir = temp_path("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("learner.json");
        std::fs::write(&path, "not json at all").unwrap();

        let err = load_or_generate(&path).unwrap_err();
        assert!(matches!(err, SyncError::Identity { .. }));
        // The file is left untouched for manual recovery.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json at all");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_identity_is_an_error() {
        let dir = temp_path("empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("learner.json");
        std::fs::write(&path, r#"{"learnerId": "  "}"#).unwrap();

        let err = load_or_generate(&path).unwrap_err();
        assert!(matches!(err, SyncError::Identity { .. }));

        std::fs::remove_dir_all(&dir).ok();
    }
}
