//! Error types for the Prompt School engine.
//!
//! This module defines the error hierarchy for catalog loading, session
//! transitions, progress persistence, and configuration handling.

use std::path::PathBuf;

/// A specialized `Result` type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur inside the Prompt School engine.
///
/// Error variants are organized by subsystem and include actionable
/// suggestions where possible. Expected outcomes (a failed validation
/// check, a prerequisite-locked lesson) are *not* errors; they are
/// ordinary return values (`Verdict`, `LessonSelection::Locked`).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your school.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Catalog Errors
    // ========================================================================
    /// The content catalog failed its integrity check.
    #[error("Catalog integrity error: {message}")]
    CatalogIntegrity {
        /// Description of the integrity violation.
        message: String,
    },

    /// A validation rule pattern failed to compile.
    #[error("Invalid validation pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// Description of the compile failure.
        message: String,
    },

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// No tutorial with the given identifier exists in the catalog.
    #[error("Unknown tutorial: '{id}'")]
    UnknownTutorial {
        /// The identifier that was not found.
        id: String,
    },

    /// No lesson with the given identifier exists in the current tutorial.
    #[error("Unknown lesson: '{id}'")]
    UnknownLesson {
        /// The identifier that was not found.
        id: String,
    },

    /// No exercise with the given identifier exists in the current lesson.
    #[error("Unknown exercise: '{id}'")]
    UnknownExercise {
        /// The identifier that was not found.
        id: String,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// A session operation was attempted from a state that does not permit it.
    #[error("Invalid session transition: cannot {action} while in state '{state}'")]
    InvalidTransition {
        /// The operation that was attempted.
        action: String,
        /// The session state at the time of the attempt.
        state: String,
    },

    // ========================================================================
    // Progress Persistence Errors
    // ========================================================================
    /// The persisted progress record contains malformed JSON.
    #[error("Corrupted progress file '{path}': {message}\n\nSuggestion: Remove the file to start from empty progress")]
    ProgressCorrupted {
        /// Path to the corrupted progress file.
        path: PathBuf,
        /// Description of the corruption.
        message: String,
    },

    /// The progress store rejected a read or write.
    #[error("Progress store failure: {message}")]
    ProgressStore {
        /// Description of the storage failure.
        message: String,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// General I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `CatalogIntegrity` error.
    #[must_use]
    pub fn catalog_integrity(message: impl Into<String>) -> Self {
        Self::CatalogIntegrity {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidPattern` error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Creates a new `UnknownTutorial` error.
    #[must_use]
    pub fn unknown_tutorial(id: impl Into<String>) -> Self {
        Self::UnknownTutorial { id: id.into() }
    }

    /// Creates a new `UnknownLesson` error.
    #[must_use]
    pub fn unknown_lesson(id: impl Into<String>) -> Self {
        Self::UnknownLesson { id: id.into() }
    }

    /// Creates a new `UnknownExercise` error.
    #[must_use]
    pub fn unknown_exercise(id: impl Into<String>) -> Self {
        Self::UnknownExercise { id: id.into() }
    }

    /// Creates a new `InvalidTransition` error.
    #[must_use]
    pub fn invalid_transition(action: impl Into<String>, state: impl Into<String>) -> Self {
        Self::InvalidTransition {
            action: action.into(),
            state: state.into(),
        }
    }

    /// Creates a new `ProgressCorrupted` error.
    #[must_use]
    pub fn progress_corrupted(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ProgressCorrupted {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ProgressStore` error.
    #[must_use]
    pub fn progress_store(message: impl Into<String>) -> Self {
        Self::ProgressStore {
            message: message.into(),
        }
    }

    /// Returns `true` if this error means a requested entity does not exist.
    ///
    /// The HTTP layer maps these to `404 Not Found`.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownTutorial { .. } | Self::UnknownLesson { .. } | Self::UnknownExercise { .. }
        )
    }

    /// Returns `true` if this error is a wrong-state session operation.
    ///
    /// The HTTP layer maps these to `409 Conflict`.
    #[must_use]
    pub const fn is_wrong_state(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}
