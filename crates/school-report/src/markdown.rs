//! Markdown report generation.
//!
//! [`MarkdownGenerator`] renders a [`ProgressReport`] as a human-readable
//! Markdown document: a summary table, one section per tutorial with a
//! lesson table, and a generation footer.

use std::fmt::Write;

use crate::{LessonState, ProgressReport, TutorialBreakdown};

/// Generates Markdown progress reports.
pub struct MarkdownGenerator<'a> {
    report: &'a ProgressReport,
}

impl<'a> MarkdownGenerator<'a> {
    /// Creates a new Markdown generator for the given report.
    #[must_use]
    pub const fn new(report: &'a ProgressReport) -> Self {
        Self { report }
    }

    /// Generates the complete Markdown report.
    #[must_use]
    pub fn generate(&self) -> String {
        let mut output = String::new();

        self.write_title(&mut output);
        self.write_summary(&mut output);
        self.write_tutorials(&mut output);
        self.write_footer(&mut output);

        output
    }

    /// Writes the report to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file write fails.
    pub fn write_to_file(&self, path: &std::path::Path) -> crate::Result<()> {
        std::fs::write(path, self.generate())?;
        Ok(())
    }

    fn write_title(&self, output: &mut String) {
        let _ = writeln!(output, "# Prompt School Progress Report");
        let _ = writeln!(output);
        let _ = writeln!(output, "**Learner:** `{}`", self.report.learner_id);
        let _ = writeln!(output);
    }

    fn write_summary(&self, output: &mut String) {
        let summary = &self.report.summary;

        let _ = writeln!(output, "## Summary");
        let _ = writeln!(output);
        let _ = writeln!(output, "| Metric | Value |");
        let _ = writeln!(output, "|--------|-------|");
        let _ = writeln!(output, "| Score | {} |", summary.score);
        let _ = writeln!(
            output,
            "| Lessons completed | {} / {} |",
            summary.lessons_completed, summary.lessons_total
        );
        let _ = writeln!(
            output,
            "| Exercises completed | {} / {} |",
            summary.exercises_completed, summary.exercises_total
        );
        let _ = writeln!(output, "| Total attempts | {} |", summary.total_attempts);
        let _ = writeln!(
            output,
            "| Overall completion | {}% |",
            self.report.overall_completion_percent()
        );
        let _ = writeln!(output);
    }

    fn write_tutorials(&self, output: &mut String) {
        for tutorial in &self.report.tutorials {
            Self::write_tutorial(output, tutorial);
        }
    }

    fn write_tutorial(output: &mut String, tutorial: &TutorialBreakdown) {
        let _ = writeln!(
            output,
            "## {} ({}, {}% complete)",
            tutorial.title, tutorial.difficulty, tutorial.completion_percent
        );
        let _ = writeln!(output);

        if tutorial.lessons.is_empty() {
            let _ = writeln!(output, "_No lessons._");
            let _ = writeln!(output);
            return;
        }

        let _ = writeln!(output, "| Lesson | Status | Exercises | Attempts |");
        let _ = writeln!(output, "|--------|--------|-----------|----------|");
        for lesson in &tutorial.lessons {
            let _ = writeln!(
                output,
                "| {} | {} | {} / {} | {} |",
                lesson.title,
                Self::status_label(lesson.status),
                lesson.exercises_completed,
                lesson.exercises_total,
                lesson.attempts
            );
        }
        let _ = writeln!(output);
    }

    fn write_footer(&self, output: &mut String) {
        let _ = writeln!(output, "---");
        let _ = writeln!(
            output,
            "_Generated at {}_",
            self.report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }

    const fn status_label(status: LessonState) -> &'static str {
        match status {
            LessonState::Completed => "✅ completed",
            LessonState::Available => "🔓 available",
            LessonState::Locked => "🔒 locked",
        }
    }
}
