//! Prompt School Report Generation
//!
//! This crate provides types and utilities for generating progress reports
//! from a learner's tutorial activity. Reports can be serialized to JSON for
//! the dashboard or rendered to Markdown for export.
//!
//! # Types
//!
//! - [`ProgressReport`] - the complete report structure
//! - [`ReportSummary`] - headline numbers across the whole catalog
//! - [`TutorialBreakdown`] - per-tutorial completion and lesson rows
//! - [`LessonRow`] - one lesson's status, exercise counts, and attempts
//!
//! # Generators
//!
//! - [`json::JsonGenerator`] - compact or pretty JSON, with a file writer
//! - [`MarkdownGenerator`] - human-readable Markdown export
//!
//! The report is built from plain data (the caller supplies the rows), so
//! this crate stays free of catalog and session dependencies.

pub mod json;
mod markdown;

pub use markdown::MarkdownGenerator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Failed to serialize the report to JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to read or write report files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;

// ============================================================================
// Lesson State (local copy to avoid cross-crate dependency)
// ============================================================================

/// Display status of a lesson at report time.
///
/// This is a local copy of the engine's lesson status to avoid a cross-crate
/// dependency; the caller maps between the two when building rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonState {
    /// The lesson has been explicitly completed.
    Completed,
    /// Open to enter.
    Available,
    /// Prerequisites are missing.
    Locked,
}

impl std::fmt::Display for LessonState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Available => write!(f, "available"),
            Self::Locked => write!(f, "locked"),
        }
    }
}

// ============================================================================
// Report Types
// ============================================================================

/// One lesson's row in a tutorial breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRow {
    /// Lesson identifier.
    pub lesson_id: String,
    /// Display title.
    pub title: String,
    /// Status at report time.
    pub status: LessonState,
    /// Exercises completed in this lesson.
    pub exercises_completed: u32,
    /// Exercises the lesson contains.
    pub exercises_total: u32,
    /// Validation attempts across the lesson's exercises.
    pub attempts: u32,
}

/// Per-tutorial progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialBreakdown {
    /// Tutorial identifier.
    pub tutorial_id: String,
    /// Display title.
    pub title: String,
    /// Difficulty label (e.g. "beginner").
    pub difficulty: String,
    /// Lessons completed / lessons total, as a whole percentage.
    pub completion_percent: u8,
    /// Per-lesson rows in learning order.
    pub lessons: Vec<LessonRow>,
}

impl TutorialBreakdown {
    /// Builds a breakdown, computing the completion percentage from the rows.
    #[must_use]
    pub fn new(
        tutorial_id: impl Into<String>,
        title: impl Into<String>,
        difficulty: impl Into<String>,
        lessons: Vec<LessonRow>,
    ) -> Self {
        let completed = lessons
            .iter()
            .filter(|l| l.status == LessonState::Completed)
            .count();
        Self {
            tutorial_id: tutorial_id.into(),
            title: title.into(),
            difficulty: difficulty.into(),
            completion_percent: percent(completed, lessons.len()),
            lessons,
        }
    }
}

/// Headline numbers across the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Cumulative score.
    pub score: u32,
    /// Lessons completed.
    pub lessons_completed: u32,
    /// Lessons in the catalog.
    pub lessons_total: u32,
    /// Exercises completed.
    pub exercises_completed: u32,
    /// Exercises in the catalog.
    pub exercises_total: u32,
    /// Validation attempts across all exercises.
    pub total_attempts: u32,
}

/// The complete progress report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    /// The learner the report describes.
    pub learner_id: String,
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Headline numbers.
    pub summary: ReportSummary,
    /// Per-tutorial breakdowns in catalog order.
    pub tutorials: Vec<TutorialBreakdown>,
}

impl ProgressReport {
    /// Creates a report, filling the summary from the breakdowns.
    ///
    /// `score` and `total_attempts` come from the progress record; lesson
    /// and exercise counts are derived from the rows.
    #[must_use]
    pub fn new(
        learner_id: impl Into<String>,
        score: u32,
        total_attempts: u32,
        tutorials: Vec<TutorialBreakdown>,
    ) -> Self {
        let rows = || tutorials.iter().flat_map(|t| t.lessons.iter());

        let summary = ReportSummary {
            score,
            lessons_completed: u32::try_from(
                rows().filter(|l| l.status == LessonState::Completed).count(),
            )
            .unwrap_or(u32::MAX),
            lessons_total: u32::try_from(rows().count()).unwrap_or(u32::MAX),
            exercises_completed: rows().map(|l| l.exercises_completed).sum(),
            exercises_total: rows().map(|l| l.exercises_total).sum(),
            total_attempts,
        };

        Self {
            learner_id: learner_id.into(),
            generated_at: Utc::now(),
            summary,
            tutorials,
        }
    }

    /// Overall lesson completion as a whole percentage.
    #[must_use]
    pub fn overall_completion_percent(&self) -> u8 {
        percent(
            self.summary.lessons_completed as usize,
            self.summary.lessons_total as usize,
        )
    }
}

/// Whole-number percentage, zero when the denominator is zero.
#[must_use]
fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    // Percentages of catalog-sized counts stay far below u8::MAX.
    #[allow(clippy::cast_possible_truncation)]
    {
        ((part * 100) / whole) as u8
    }
}
