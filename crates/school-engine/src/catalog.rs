//! The content catalog: tutorials, lessons, and exercises.
//!
//! Catalog data is immutable once constructed. Construction runs an
//! integrity check so the rest of the engine can rely on identifiers being
//! unique and prerequisites being resolvable.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::validate::ValidationRule;

/// Difficulty rating for a tutorial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Suitable for learners with no prior prompt-engineering experience.
    Beginner,
    /// Assumes familiarity with the foundations.
    Intermediate,
    /// Assumes substantial hands-on experience.
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

/// A worked example shown alongside a lesson's theory text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkedExample {
    /// Short label for the example.
    pub title: String,
    /// The example prompt or snippet itself.
    pub code: String,
    /// Commentary explaining why the example works.
    pub commentary: String,
}

/// A single hands-on exercise.
///
/// The reference `solution` must satisfy the exercise's own `rule`; the
/// builtin catalog's tests enforce this for every shipped exercise.
#[derive(Debug)]
pub struct Exercise {
    /// Unique identifier, stable across releases.
    pub id: String,
    /// Display title.
    pub title: String,
    /// What the learner is asked to do.
    pub description: String,
    /// Initial contents of the submission buffer.
    pub starter_code: String,
    /// A reference solution that passes `rule`.
    pub solution: String,
    /// Ordered hints, revealed one at a time.
    pub hints: Vec<String>,
    /// The validation strategy for submissions.
    pub rule: ValidationRule,
}

/// A lesson: theory, worked examples, and exercises.
#[derive(Debug)]
pub struct Lesson {
    /// Unique identifier, stable across releases.
    pub id: String,
    /// Display title.
    pub title: String,
    /// One-line summary.
    pub description: String,
    /// Estimated time to complete, in minutes.
    pub duration_minutes: u32,
    /// Concept tags covered by the lesson.
    pub concepts: Vec<String>,
    /// The lesson's theory text (markdown).
    pub theory: String,
    /// Worked examples accompanying the theory.
    pub examples: Vec<WorkedExample>,
    /// Hands-on exercises, in order.
    pub exercises: Vec<Exercise>,
    /// Lesson identifiers that must be completed before this lesson unlocks.
    /// Prerequisites always refer to lessons in the same tutorial.
    pub prerequisites: Vec<String>,
}

impl Lesson {
    /// Looks up an exercise of this lesson by identifier.
    #[must_use]
    pub fn exercise(&self, exercise_id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == exercise_id)
    }
}

/// A tutorial: an ordered sequence of lessons.
#[derive(Debug)]
pub struct Tutorial {
    /// Unique identifier, stable across releases.
    pub id: String,
    /// Display title.
    pub title: String,
    /// One-line summary.
    pub description: String,
    /// Overall difficulty rating.
    pub difficulty: Difficulty,
    /// Estimated time to complete, in minutes.
    pub duration_minutes: u32,
    /// Lessons in learning order.
    pub lessons: Vec<Lesson>,
}

impl Tutorial {
    /// Looks up a lesson of this tutorial by identifier.
    #[must_use]
    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    /// The first lesson in learning order.
    ///
    /// Catalog integrity guarantees every tutorial has at least one lesson,
    /// so this only returns `None` for hand-built tutorials that bypassed
    /// [`Catalog::new`].
    #[must_use]
    pub fn first_lesson(&self) -> Option<&Lesson> {
        self.lessons.first()
    }

    /// Total number of exercises across all lessons.
    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.lessons.iter().map(|l| l.exercises.len()).sum()
    }
}

/// The full content catalog.
#[derive(Debug)]
pub struct Catalog {
    tutorials: Vec<Tutorial>,
}

impl Catalog {
    /// Builds a catalog from tutorials, running the integrity check.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::CatalogIntegrity`] when:
    /// - a tutorial, lesson, or exercise identifier is duplicated anywhere
    ///   in the catalog;
    /// - a tutorial has no lessons;
    /// - a prerequisite names a lesson outside its own tutorial, or names
    ///   the lesson itself.
    pub fn new(tutorials: Vec<Tutorial>) -> Result<Self> {
        validate_integrity(&tutorials)?;
        Ok(Self { tutorials })
    }

    /// The builtin prompt-engineering catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Propagates pattern-compilation and integrity errors, neither of which
    /// occurs for the shipped content (the builtin tests exercise this).
    pub fn builtin() -> Result<Self> {
        Self::new(crate::content::builtin_tutorials()?)
    }

    /// All tutorials in catalog order.
    #[must_use]
    pub fn tutorials(&self) -> &[Tutorial] {
        &self.tutorials
    }

    /// Looks up a tutorial by identifier.
    #[must_use]
    pub fn tutorial(&self, tutorial_id: &str) -> Option<&Tutorial> {
        self.tutorials.iter().find(|t| t.id == tutorial_id)
    }

    /// Looks up a lesson by tutorial and lesson identifier.
    #[must_use]
    pub fn lesson(&self, tutorial_id: &str, lesson_id: &str) -> Option<&Lesson> {
        self.tutorial(tutorial_id)?.lesson(lesson_id)
    }

    /// Looks up an exercise by tutorial, lesson, and exercise identifier.
    #[must_use]
    pub fn exercise(
        &self,
        tutorial_id: &str,
        lesson_id: &str,
        exercise_id: &str,
    ) -> Option<&Exercise> {
        self.lesson(tutorial_id, lesson_id)?.exercise(exercise_id)
    }

    /// Total number of lessons across all tutorials.
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.tutorials.iter().map(|t| t.lessons.len()).sum()
    }

    /// Total number of exercises across all tutorials.
    #[must_use]
    pub fn exercise_count(&self) -> usize {
        self.tutorials.iter().map(Tutorial::exercise_count).sum()
    }
}

/// Checks identifier uniqueness and prerequisite resolvability.
fn validate_integrity(tutorials: &[Tutorial]) -> Result<()> {
    use std::collections::HashSet;

    let mut tutorial_ids = HashSet::new();
    let mut lesson_ids = HashSet::new();
    let mut exercise_ids = HashSet::new();

    for tutorial in tutorials {
        if !tutorial_ids.insert(tutorial.id.as_str()) {
            return Err(EngineError::catalog_integrity(format!(
                "duplicate tutorial id '{}'",
                tutorial.id
            )));
        }
        if tutorial.lessons.is_empty() {
            return Err(EngineError::catalog_integrity(format!(
                "tutorial '{}' has no lessons",
                tutorial.id
            )));
        }

        let local_lessons: HashSet<&str> =
            tutorial.lessons.iter().map(|l| l.id.as_str()).collect();

        for lesson in &tutorial.lessons {
            if !lesson_ids.insert(lesson.id.as_str()) {
                return Err(EngineError::catalog_integrity(format!(
                    "duplicate lesson id '{}'",
                    lesson.id
                )));
            }

            for prerequisite in &lesson.prerequisites {
                if prerequisite == &lesson.id {
                    return Err(EngineError::catalog_integrity(format!(
                        "lesson '{}' lists itself as a prerequisite",
                        lesson.id
                    )));
                }
                if !local_lessons.contains(prerequisite.as_str()) {
                    return Err(EngineError::catalog_integrity(format!(
                        "lesson '{}' requires unknown lesson '{}' (prerequisites must name lessons in tutorial '{}')",
                        lesson.id, prerequisite, tutorial.id
                    )));
                }
            }

            for exercise in &lesson.exercises {
                if !exercise_ids.insert(exercise.id.as_str()) {
                    return Err(EngineError::catalog_integrity(format!(
                        "duplicate exercise id '{}'",
                        exercise.id
                    )));
                }
            }
        }
    }

    Ok(())
}
