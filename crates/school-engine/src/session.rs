//! The tutorial session state machine.
//!
//! A session moves `Catalog -> TutorialSelected -> LessonActive ->
//! ExerciseActive` and back. Lesson entry is gated on prerequisites; a
//! refused entry is an ordinary [`LessonSelection::Locked`] value, never an
//! error, and leaves the state untouched. There is no terminal state: the
//! learner can always return to the catalog.

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::{Catalog, Exercise, Lesson, Tutorial};
use crate::error::{EngineError, Result};
use crate::progress::{AttemptOutcome, LessonOutcome, ProgressTracker, UserProgress};
use crate::validate::Verdict;

// ============================================================================
// SessionState
// ============================================================================

/// Where the learner currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No tutorial selected; browsing the catalog.
    Catalog,
    /// A tutorial is selected; `lesson_id` is the current lesson.
    TutorialSelected {
        /// The selected tutorial.
        tutorial_id: String,
        /// The current lesson (initially the tutorial's first lesson).
        lesson_id: String,
    },
    /// A lesson's theory, examples, and exercises are open.
    LessonActive {
        /// The selected tutorial.
        tutorial_id: String,
        /// The open lesson.
        lesson_id: String,
    },
    /// An exercise is open in the focused editing view.
    ExerciseActive {
        /// The selected tutorial.
        tutorial_id: String,
        /// The lesson the exercise belongs to.
        lesson_id: String,
        /// The open exercise.
        exercise_id: String,
        /// The editable submission buffer.
        buffer: String,
        /// The most recent verdict, if the learner has checked.
        verdict: Option<Verdict>,
        /// How many hints have been revealed (0 = none).
        hints_revealed: usize,
    },
}

impl SessionState {
    /// Short state name used in transition errors and the API view.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::TutorialSelected { .. } => "tutorial_selected",
            Self::LessonActive { .. } => "lesson_active",
            Self::ExerciseActive { .. } => "exercise_active",
        }
    }
}

/// Result of attempting to enter a lesson.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonSelection {
    /// The lesson was entered; the session is now `LessonActive`.
    Entered,
    /// The lesson is gated; nothing changed.
    Locked {
        /// Prerequisite lessons still missing from the completed set.
        missing: Vec<String>,
    },
}

/// Display status of a lesson, derived from progress and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    /// The lesson has been explicitly completed.
    Completed,
    /// At least one prerequisite is missing.
    Locked,
    /// Open to enter.
    Available,
}

impl std::fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Locked => write!(f, "locked"),
            Self::Available => write!(f, "available"),
        }
    }
}

/// Derives a lesson's display status from the learner's progress.
///
/// Pure: recomputed on demand, stored nowhere.
#[must_use]
pub fn lesson_status(lesson: &Lesson, progress: &UserProgress) -> LessonStatus {
    if progress.is_lesson_completed(&lesson.id) {
        LessonStatus::Completed
    } else if missing_prerequisites(lesson, progress).is_empty() {
        LessonStatus::Available
    } else {
        LessonStatus::Locked
    }
}

/// Prerequisite lesson ids not yet in the completed set, in catalog order.
#[must_use]
pub fn missing_prerequisites(lesson: &Lesson, progress: &UserProgress) -> Vec<String> {
    lesson
        .prerequisites
        .iter()
        .filter(|p| !progress.is_lesson_completed(p))
        .cloned()
        .collect()
}

// ============================================================================
// SessionController
// ============================================================================

/// Orchestrates navigation, validation, and progress for one learner session.
pub struct SessionController {
    catalog: Arc<Catalog>,
    tracker: ProgressTracker,
    state: SessionState,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Creates a controller at the catalog view.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, tracker: ProgressTracker) -> Self {
        Self {
            catalog,
            tracker,
            state: SessionState::Catalog,
        }
    }

    /// The current session state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The catalog this session runs against.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The learner's current progress.
    #[must_use]
    pub fn progress(&self) -> &UserProgress {
        self.tracker.progress()
    }

    /// The currently selected tutorial, if any.
    #[must_use]
    pub fn current_tutorial(&self) -> Option<&Tutorial> {
        match &self.state {
            SessionState::Catalog => None,
            SessionState::TutorialSelected { tutorial_id, .. }
            | SessionState::LessonActive { tutorial_id, .. }
            | SessionState::ExerciseActive { tutorial_id, .. } => {
                self.catalog.tutorial(tutorial_id)
            }
        }
    }

    /// The current lesson, if any.
    #[must_use]
    pub fn current_lesson(&self) -> Option<&Lesson> {
        match &self.state {
            SessionState::Catalog => None,
            SessionState::TutorialSelected {
                tutorial_id,
                lesson_id,
            }
            | SessionState::LessonActive {
                tutorial_id,
                lesson_id,
            }
            | SessionState::ExerciseActive {
                tutorial_id,
                lesson_id,
                ..
            } => self.catalog.lesson(tutorial_id, lesson_id),
        }
    }

    /// The open exercise, if the session is in the exercise view.
    #[must_use]
    pub fn current_exercise(&self) -> Option<&Exercise> {
        match &self.state {
            SessionState::ExerciseActive {
                tutorial_id,
                lesson_id,
                exercise_id,
                ..
            } => self.catalog.exercise(tutorial_id, lesson_id, exercise_id),
            _ => None,
        }
    }

    /// Hints revealed so far for the open exercise.
    #[must_use]
    pub fn revealed_hints(&self) -> &[String] {
        match (&self.state, self.current_exercise()) {
            (SessionState::ExerciseActive { hints_revealed, .. }, Some(exercise)) => {
                let count = (*hints_revealed).min(exercise.hints.len());
                &exercise.hints[..count]
            }
            _ => &[],
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// `Catalog -> TutorialSelected`, current lesson set to the first lesson.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] outside the catalog view and
    /// [`EngineError::UnknownTutorial`] for an id not in the catalog.
    pub fn select_tutorial(&mut self, tutorial_id: &str) -> Result<()> {
        if !matches!(self.state, SessionState::Catalog) {
            return Err(self.wrong_state("select a tutorial"));
        }

        let tutorial = self
            .catalog
            .tutorial(tutorial_id)
            .ok_or_else(|| EngineError::unknown_tutorial(tutorial_id))?;
        let first_lesson = tutorial
            .first_lesson()
            .ok_or_else(|| EngineError::catalog_integrity(format!(
                "tutorial '{tutorial_id}' has no lessons"
            )))?;

        tracing::info!(tutorial_id, "tutorial selected");
        self.state = SessionState::TutorialSelected {
            tutorial_id: tutorial.id.clone(),
            lesson_id: first_lesson.id.clone(),
        };
        Ok(())
    }

    /// Attempts to enter a lesson of the current tutorial.
    ///
    /// Gated: if any prerequisite is missing from the completed set, the
    /// result is [`LessonSelection::Locked`] and the state is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] when no tutorial is
    /// selected or an exercise is open, and [`EngineError::UnknownLesson`]
    /// for an id not in the current tutorial.
    pub fn select_lesson(&mut self, lesson_id: &str) -> Result<LessonSelection> {
        let tutorial_id = match &self.state {
            SessionState::TutorialSelected { tutorial_id, .. }
            | SessionState::LessonActive { tutorial_id, .. } => tutorial_id.clone(),
            _ => return Err(self.wrong_state("select a lesson")),
        };

        let lesson = self
            .catalog
            .lesson(&tutorial_id, lesson_id)
            .ok_or_else(|| EngineError::unknown_lesson(lesson_id))?;

        let missing = missing_prerequisites(lesson, self.tracker.progress());
        if !missing.is_empty() {
            tracing::debug!(lesson_id, ?missing, "lesson entry refused: prerequisites missing");
            return Ok(LessonSelection::Locked { missing });
        }

        tracing::info!(lesson_id, "lesson entered");
        self.state = SessionState::LessonActive {
            tutorial_id,
            lesson_id: lesson.id.clone(),
        };
        Ok(LessonSelection::Entered)
    }

    /// `LessonActive -> ExerciseActive`, seeding the buffer from starter code
    /// and clearing any previous verdict and hint reveals.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] outside a lesson and
    /// [`EngineError::UnknownExercise`] for an id not in the current lesson.
    pub fn start_exercise(&mut self, exercise_id: &str) -> Result<()> {
        let (tutorial_id, lesson_id) = match &self.state {
            SessionState::LessonActive {
                tutorial_id,
                lesson_id,
            } => (tutorial_id.clone(), lesson_id.clone()),
            _ => return Err(self.wrong_state("start an exercise")),
        };

        let exercise = self
            .catalog
            .exercise(&tutorial_id, &lesson_id, exercise_id)
            .ok_or_else(|| EngineError::unknown_exercise(exercise_id))?;

        tracing::info!(exercise_id, "exercise started");
        self.state = SessionState::ExerciseActive {
            tutorial_id,
            lesson_id,
            exercise_id: exercise.id.clone(),
            buffer: exercise.starter_code.clone(),
            verdict: None,
            hints_revealed: 0,
        };
        Ok(())
    }

    /// Replaces the submission buffer of the open exercise.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] when no exercise is open.
    pub fn update_buffer(&mut self, text: String) -> Result<()> {
        match &mut self.state {
            SessionState::ExerciseActive { buffer, .. } => {
                *buffer = text;
                Ok(())
            }
            _ => Err(self.wrong_state("edit a submission")),
        }
    }

    /// Checks the current buffer against the open exercise's rule.
    ///
    /// Always records an attempt; a success completes the exercise through
    /// the tracker (first success only). The session stays in the exercise
    /// view; the learner exits explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] when no exercise is open.
    pub fn check(&mut self) -> Result<AttemptOutcome> {
        let (exercise_id, buffer) = match &self.state {
            SessionState::ExerciseActive {
                exercise_id,
                buffer,
                ..
            } => (exercise_id.clone(), buffer.clone()),
            _ => return Err(self.wrong_state("check a submission")),
        };

        // The exercise came from the catalog when it was started; it cannot
        // have vanished since the catalog is immutable.
        let exercise = self
            .current_exercise()
            .ok_or_else(|| EngineError::unknown_exercise(&exercise_id))?;

        let verdict = exercise.rule.check(&buffer);
        let outcome = self.tracker.record_exercise_attempt(&exercise_id, &verdict);

        tracing::info!(
            exercise_id = %exercise_id,
            success = verdict.success,
            attempts = outcome.attempts,
            "submission checked"
        );

        if let SessionState::ExerciseActive { verdict: slot, .. } = &mut self.state {
            *slot = Some(verdict);
        }
        Ok(outcome)
    }

    /// Reveals the next hint. Monotonic and capped at the hint count;
    /// already-revealed hints stay revealed until the exercise is restarted.
    ///
    /// Returns the number of hints now revealed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] when no exercise is open.
    pub fn reveal_next_hint(&mut self) -> Result<usize> {
        let hint_count = self
            .current_exercise()
            .map(|e| e.hints.len())
            .ok_or_else(|| self.wrong_state("reveal a hint"))?;

        match &mut self.state {
            SessionState::ExerciseActive { hints_revealed, .. } => {
                *hints_revealed = (*hints_revealed + 1).min(hint_count);
                Ok(*hints_revealed)
            }
            _ => Err(self.wrong_state("reveal a hint")),
        }
    }

    /// `ExerciseActive -> LessonActive`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] when no exercise is open.
    pub fn close_exercise(&mut self) -> Result<()> {
        match &self.state {
            SessionState::ExerciseActive {
                tutorial_id,
                lesson_id,
                ..
            } => {
                self.state = SessionState::LessonActive {
                    tutorial_id: tutorial_id.clone(),
                    lesson_id: lesson_id.clone(),
                };
                Ok(())
            }
            _ => Err(self.wrong_state("close an exercise")),
        }
    }

    /// Explicitly completes the current lesson. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTransition`] outside the lesson view.
    pub fn mark_lesson_complete(&mut self) -> Result<LessonOutcome> {
        let lesson_id = match &self.state {
            SessionState::LessonActive { lesson_id, .. } => lesson_id.clone(),
            _ => return Err(self.wrong_state("complete a lesson")),
        };

        let outcome = self.tracker.complete_lesson(&lesson_id);
        if outcome.newly_completed {
            tracing::info!(lesson_id = %lesson_id, score = outcome.score, "lesson completed");
        }
        Ok(outcome)
    }

    /// Returns to the catalog view. Always permitted.
    pub fn return_to_catalog(&mut self) {
        self.state = SessionState::Catalog;
    }

    /// Display status of a lesson in the current tutorial.
    #[must_use]
    pub fn status_of(&self, lesson: &Lesson) -> LessonStatus {
        lesson_status(lesson, self.tracker.progress())
    }

    fn wrong_state(&self, action: &str) -> EngineError {
        EngineError::invalid_transition(action, self.state.name())
    }
}
