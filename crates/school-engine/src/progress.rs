//! Learner progress: the persisted record and its tracker.
//!
//! [`UserProgress`] is the single mutable record per learner. Every mutation
//! goes through [`ProgressTracker`], which writes the full state through its
//! [`ProgressStore`] immediately (write-through, no batching). A failed write
//! never rolls back the in-memory mutation; it is reported in the outcome so
//! the caller can decide whether to warn.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::validate::Verdict;

/// Schema version stamped into every persisted progress record.
///
/// Older records load with missing fields default-filled; the version lets a
/// future migration distinguish shapes explicitly.
pub const PROGRESS_VERSION: u32 = 1;

/// Points awarded the first time a lesson is completed.
pub const LESSON_BONUS: u32 = 50;

/// Points awarded the first time an exercise is completed.
pub const EXERCISE_BONUS: u32 = 10;

const fn default_version() -> u32 {
    PROGRESS_VERSION
}

/// The learner's cumulative progress.
///
/// Invariants (enforced by [`ProgressTracker`], checked by its tests):
/// - a lesson enters `completed_lessons` only through an explicit completion
///   action, never as a side effect of exercise success;
/// - an exercise enters `completed_exercises` at most once, and its bonus is
///   awarded exactly once;
/// - attempt counts only ever increase;
/// - `score` never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    /// Schema version of this record.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Identifiers of lessons the learner has explicitly completed.
    #[serde(default)]
    pub completed_lessons: BTreeSet<String>,

    /// Validation attempts per exercise, success or failure alike.
    #[serde(default)]
    pub exercise_attempts: BTreeMap<String, u32>,

    /// Identifiers of exercises the learner has solved at least once.
    #[serde(default)]
    pub completed_exercises: BTreeSet<String>,

    /// Cumulative score.
    #[serde(default)]
    pub score: u32,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl UserProgress {
    /// Creates an empty progress record at the current schema version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: PROGRESS_VERSION,
            completed_lessons: BTreeSet::new(),
            exercise_attempts: BTreeMap::new(),
            completed_exercises: BTreeSet::new(),
            score: 0,
        }
    }

    /// Number of validation attempts recorded for an exercise.
    #[must_use]
    pub fn attempts_for(&self, exercise_id: &str) -> u32 {
        self.exercise_attempts.get(exercise_id).copied().unwrap_or(0)
    }

    /// Returns `true` if the lesson has been explicitly completed.
    #[must_use]
    pub fn is_lesson_completed(&self, lesson_id: &str) -> bool {
        self.completed_lessons.contains(lesson_id)
    }

    /// Returns `true` if the exercise has been solved at least once.
    #[must_use]
    pub fn is_exercise_completed(&self, exercise_id: &str) -> bool {
        self.completed_exercises.contains(exercise_id)
    }

    /// Total attempts across all exercises.
    #[must_use]
    pub fn total_attempts(&self) -> u32 {
        self.exercise_attempts.values().sum()
    }

    /// Increments the attempt counter for an exercise, returning the new count.
    fn note_attempt(&mut self, exercise_id: &str) -> u32 {
        let count = self
            .exercise_attempts
            .entry(exercise_id.to_string())
            .or_insert(0);
        *count += 1;
        *count
    }

    /// Marks an exercise completed. Returns `true` and awards the bonus only
    /// on the first completion.
    fn complete_exercise(&mut self, exercise_id: &str) -> bool {
        let first = self.completed_exercises.insert(exercise_id.to_string());
        if first {
            self.score += EXERCISE_BONUS;
        }
        first
    }

    /// Marks a lesson completed. Returns `true` and awards the bonus only on
    /// the first completion.
    fn complete_lesson(&mut self, lesson_id: &str) -> bool {
        let first = self.completed_lessons.insert(lesson_id.to_string());
        if first {
            self.score += LESSON_BONUS;
        }
        first
    }
}

// ============================================================================
// Storage port
// ============================================================================

/// The narrow storage port behind the tracker.
///
/// Implementations must treat "nothing persisted yet" as `Ok(None)`, not as
/// an error, and must report write failures so the caller can surface them.
pub trait ProgressStore: Send + Sync {
    /// Reads the persisted progress, if any exists.
    fn load(&self) -> Result<Option<UserProgress>>;

    /// Persists the full progress record, replacing any previous state.
    fn save(&self, progress: &UserProgress) -> Result<()>;
}

/// Durable JSON-file progress storage.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the given file path.
    ///
    /// The file and its parent directories are created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> Result<Option<UserProgress>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(EngineError::Io(e)),
        };

        let progress = serde_json::from_str(&contents)
            .map_err(|e| EngineError::progress_corrupted(&self.path, e.to_string()))?;
        Ok(Some(progress))
    }

    fn save(&self, progress: &UserProgress) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(progress)?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// In-memory progress storage, for tests and ephemeral sessions.
///
/// `fail_saves` flips the store into a mode where every save fails, which
/// tests use to exercise the write-failure feedback path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Option<UserProgress>>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent save fail (or succeed again).
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Returns a copy of the stored progress, if any.
    #[must_use]
    pub fn stored(&self) -> Option<UserProgress> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<Option<UserProgress>> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, progress: &UserProgress) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(EngineError::progress_store("memory store is set to fail"));
        }
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = Some(progress.clone());
        Ok(())
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Result of recording one validation attempt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOutcome {
    /// The exercise the attempt was recorded against.
    pub exercise_id: String,
    /// The verdict produced by the exercise's rule.
    pub verdict: Verdict,
    /// Attempt count for this exercise after the increment.
    pub attempts: u32,
    /// `true` only when this attempt completed the exercise for the first time.
    pub newly_completed: bool,
    /// Cumulative score after any bonus.
    pub score: u32,
    /// Whether the write-through persist succeeded.
    pub saved: bool,
}

/// Result of a lesson-completion action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonOutcome {
    /// The lesson the action applied to.
    pub lesson_id: String,
    /// `true` only when this call completed the lesson for the first time.
    pub newly_completed: bool,
    /// Cumulative score after any bonus.
    pub score: u32,
    /// Whether the write-through persist succeeded.
    pub saved: bool,
}

// ============================================================================
// Tracker
// ============================================================================

/// Owns the learner's progress and its storage binding.
pub struct ProgressTracker {
    progress: UserProgress,
    store: Box<dyn ProgressStore>,
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

impl ProgressTracker {
    /// Loads persisted progress from the store, or starts from an empty
    /// default when nothing is persisted yet.
    ///
    /// # Errors
    ///
    /// Returns the store's error when the persisted record exists but cannot
    /// be read (e.g. [`EngineError::ProgressCorrupted`]). Absence is not an
    /// error.
    pub fn load_or_default(store: Box<dyn ProgressStore>) -> Result<Self> {
        let progress = store.load()?.unwrap_or_else(UserProgress::new);
        Ok(Self { progress, store })
    }

    /// Creates a tracker over explicit initial progress (used by tests and
    /// crash recovery).
    #[must_use]
    pub fn with_progress(store: Box<dyn ProgressStore>, progress: UserProgress) -> Self {
        Self { progress, store }
    }

    /// The current progress record.
    #[must_use]
    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    /// Records one validation attempt for an exercise.
    ///
    /// The attempt counter always increments, success or failure. A
    /// successful verdict completes the exercise and awards its bonus only if
    /// the exercise was not already completed. The full state is persisted
    /// before returning; a failed persist is reported via `saved`, and the
    /// in-memory state keeps the mutation either way.
    pub fn record_exercise_attempt(&mut self, exercise_id: &str, verdict: &Verdict) -> AttemptOutcome {
        let attempts = self.progress.note_attempt(exercise_id);
        let newly_completed = verdict.success && self.progress.complete_exercise(exercise_id);
        let saved = self.persist();

        AttemptOutcome {
            exercise_id: exercise_id.to_string(),
            verdict: verdict.clone(),
            attempts,
            newly_completed,
            score: self.progress.score,
            saved,
        }
    }

    /// Completes a lesson. Idempotent: repeat calls change nothing and award
    /// nothing, but still report the current score.
    pub fn complete_lesson(&mut self, lesson_id: &str) -> LessonOutcome {
        let newly_completed = self.progress.complete_lesson(lesson_id);
        // Repeat completions mutate nothing, so there is nothing to persist.
        let saved = if newly_completed { self.persist() } else { true };

        LessonOutcome {
            lesson_id: lesson_id.to_string(),
            newly_completed,
            score: self.progress.score,
            saved,
        }
    }

    /// Writes the full state through the store, reporting success.
    fn persist(&self) -> bool {
        match self.store.save(&self.progress) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to persist progress; in-memory state retained");
                false
            }
        }
    }
}
