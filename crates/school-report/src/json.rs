//! JSON report generation.
//!
//! [`JsonGenerator`] serializes a [`ProgressReport`] either compact (for the
//! dashboard to consume) or pretty-printed (for humans reading the export).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::{ProgressReport, Result};

/// JSON report generator.
///
/// Wraps a [`ProgressReport`] reference and serializes it on demand.
///
/// # Example
///
/// ```rust
/// use school_report::ProgressReport;
/// use school_report::json::JsonGenerator;
///
/// let report = ProgressReport::new("learner-1", 0, 0, vec![]);
/// let generator = JsonGenerator::new(&report);
///
/// let json = generator.generate_pretty().unwrap();
/// assert!(json.contains("learnerId"));
/// ```
pub struct JsonGenerator<'a> {
    report: &'a ProgressReport,
}

impl<'a> JsonGenerator<'a> {
    /// Creates a new JSON generator for the given report.
    #[must_use]
    pub const fn new(report: &'a ProgressReport) -> Self {
        Self { report }
    }

    /// Generates compact single-line JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReportError::Serialization`] if serialization fails.
    pub fn generate(&self) -> Result<String> {
        Ok(serde_json::to_string(self.report)?)
    }

    /// Generates pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReportError::Serialization`] if serialization fails.
    pub fn generate_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self.report)?)
    }

    /// Writes the report to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn write_to_file(&self, path: &Path, pretty: bool) -> Result<()> {
        let contents = if pretty {
            self.generate_pretty()?
        } else {
            self.generate()?
        };

        let mut file = File::create(path)?;
        file.write_all(contents.as_bytes())?;
        Ok(())
    }
}
