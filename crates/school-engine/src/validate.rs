//! Exercise validation for Prompt School.
//!
//! Every exercise owns its own [`ValidationRule`], attached when the catalog
//! is constructed. A rule maps a submitted text to a [`Verdict`] and nothing
//! else: no I/O, no hidden state, and identical submissions always produce
//! identical verdicts. There is no central dispatcher keyed on exercise
//! identity; new exercises supply new rules.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// The outcome of validating an exercise submission.
///
/// A failed verdict is an expected, user-facing result, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Whether the submission satisfied the exercise's rule.
    pub success: bool,
    /// Human-readable feedback: corrective on failure, encouraging on success.
    pub message: String,
}

impl Verdict {
    /// Creates a passing verdict with the given message.
    #[must_use]
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates a failing verdict with the given corrective message.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// How a single requirement inspects the submission.
#[derive(Debug, Clone)]
enum Matcher {
    /// Case-insensitive literal containment.
    Contains(String),
    /// Regex match against the raw submission.
    Pattern(Regex),
}

/// One condition of a conjunctive validation rule.
///
/// Requirements are evaluated in declaration order; the first unmet
/// requirement ends the check with its corrective message.
#[derive(Debug, Clone)]
pub struct Requirement {
    matcher: Matcher,
    message: String,
}

impl Requirement {
    /// Requires the submission to contain `needle` (case-insensitive).
    #[must_use]
    pub fn contains(needle: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Contains(needle.into().to_lowercase()),
            message: message.into(),
        }
    }

    /// Requires the submission to match the given regex pattern.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPattern`] if the pattern does not compile.
    pub fn matches(pattern: &str, message: impl Into<String>) -> Result<Self> {
        let regex =
            Regex::new(pattern).map_err(|e| EngineError::invalid_pattern(pattern, e.to_string()))?;
        Ok(Self {
            matcher: Matcher::Pattern(regex),
            message: message.into(),
        })
    }

    /// Returns `true` if the submission satisfies this requirement.
    fn is_met(&self, submission: &str) -> bool {
        match &self.matcher {
            Matcher::Contains(needle) => submission.to_lowercase().contains(needle),
            Matcher::Pattern(regex) => regex.is_match(submission),
        }
    }

    /// The corrective message shown when this requirement is not met.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// The validation strategy for one exercise.
///
/// Most exercises use the declarative conjunction form
/// ([`ValidationRule::all`]); exercises whose conditions cannot be expressed
/// as containment/pattern checks inject a custom predicate
/// ([`ValidationRule::custom`]).
pub struct ValidationRule {
    kind: RuleKind,
}

enum RuleKind {
    All {
        requirements: Vec<Requirement>,
        success_message: String,
    },
    Custom(Box<dyn Fn(&str) -> Verdict + Send + Sync>),
}

impl std::fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            RuleKind::All { requirements, .. } => f
                .debug_struct("ValidationRule")
                .field("requirements", &requirements.len())
                .finish_non_exhaustive(),
            RuleKind::Custom(_) => f
                .debug_struct("ValidationRule")
                .field("custom", &true)
                .finish_non_exhaustive(),
        }
    }
}

impl ValidationRule {
    /// Creates a rule that passes only when every requirement is met.
    ///
    /// Requirements are checked in order and the first failure returns
    /// immediately with its own corrective message.
    #[must_use]
    pub fn all(requirements: Vec<Requirement>, success_message: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::All {
                requirements,
                success_message: success_message.into(),
            },
        }
    }

    /// Creates a rule from an arbitrary pure predicate.
    ///
    /// The predicate must be deterministic: the same submission must always
    /// produce the same verdict.
    #[must_use]
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> Verdict + Send + Sync + 'static,
    {
        Self {
            kind: RuleKind::Custom(Box::new(predicate)),
        }
    }

    /// Validates a submission, producing a verdict.
    ///
    /// Blank submissions fail before any requirement runs.
    #[must_use]
    pub fn check(&self, submission: &str) -> Verdict {
        if submission.trim().is_empty() {
            return Verdict::fail("Your submission is empty. Write your prompt in the editor, then check it again.");
        }

        match &self.kind {
            RuleKind::All {
                requirements,
                success_message,
            } => {
                for requirement in requirements {
                    if !requirement.is_met(submission) {
                        return Verdict::fail(requirement.message.clone());
                    }
                }
                Verdict::pass(success_message.clone())
            }
            RuleKind::Custom(predicate) => predicate(submission),
        }
    }
}
