//! WebSocket event types and broadcasting for dashboard observation.
//!
//! The dashboard subscribes to a WebSocket stream and hears about session
//! activity as it happens: checks, completions, and persistence outcomes.
//! Events are broadcast to all connected clients; a client that connects
//! mid-session receives a `connected` event carrying the current progress.
//!
//! # Event Types
//!
//! - `connected` - sent once when a client connects, includes current progress
//! - `exercise_checked` - a submission was validated
//! - `lesson_completed` - a lesson-completion action ran
//! - `progress_saved` - outcome of a write-through persist
//! - `session_error` - a session operation failed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::progress::{AttemptOutcome, LessonOutcome, UserProgress};

/// Default broadcast channel capacity.
const DEFAULT_CAPACITY: usize = 100;

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload for the `connected` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    /// The learner's progress at connect time.
    pub progress: UserProgress,
}

/// Payload for the `exercise_checked` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCheckedPayload {
    /// The exercise that was checked.
    pub exercise_id: String,
    /// Whether the submission passed.
    pub success: bool,
    /// Attempt count for this exercise after the check.
    pub attempts: u32,
    /// `true` only on the first success for this exercise.
    pub newly_completed: bool,
    /// Cumulative score after any bonus.
    pub score: u32,
    /// When the check happened.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `lesson_completed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonCompletedPayload {
    /// The lesson the completion action applied to.
    pub lesson_id: String,
    /// `false` for idempotent repeats.
    pub newly_completed: bool,
    /// Cumulative score after any bonus.
    pub score: u32,
    /// When the completion happened.
    pub timestamp: DateTime<Utc>,
}

/// Payload for the `progress_saved` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSavedPayload {
    /// Whether the write-through persist succeeded.
    pub saved: bool,
}

/// Payload for the `session_error` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionErrorPayload {
    /// Human-readable error message.
    pub message: String,
}

// ============================================================================
// Event Enum
// ============================================================================

/// Session events streamed to dashboard clients.
///
/// Serialized as JSON objects with `event` and `payload` fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Sent once when a client connects.
    Connected(ConnectedPayload),
    /// A submission was validated.
    ExerciseChecked(ExerciseCheckedPayload),
    /// A lesson-completion action ran.
    LessonCompleted(LessonCompletedPayload),
    /// Outcome of a write-through persist.
    ProgressSaved(ProgressSavedPayload),
    /// A session operation failed.
    SessionError(SessionErrorPayload),
}

impl SessionEvent {
    /// Creates a `Connected` event carrying the current progress.
    #[must_use]
    pub const fn connected(progress: UserProgress) -> Self {
        Self::Connected(ConnectedPayload { progress })
    }

    /// Creates an `ExerciseChecked` event from an attempt outcome.
    #[must_use]
    pub fn exercise_checked(outcome: &AttemptOutcome) -> Self {
        Self::ExerciseChecked(ExerciseCheckedPayload {
            exercise_id: outcome.exercise_id.clone(),
            success: outcome.verdict.success,
            attempts: outcome.attempts,
            newly_completed: outcome.newly_completed,
            score: outcome.score,
            timestamp: Utc::now(),
        })
    }

    /// Creates a `LessonCompleted` event from a lesson outcome.
    #[must_use]
    pub fn lesson_completed(outcome: &LessonOutcome) -> Self {
        Self::LessonCompleted(LessonCompletedPayload {
            lesson_id: outcome.lesson_id.clone(),
            newly_completed: outcome.newly_completed,
            score: outcome.score,
            timestamp: Utc::now(),
        })
    }

    /// Creates a `ProgressSaved` event.
    #[must_use]
    pub const fn progress_saved(saved: bool) -> Self {
        Self::ProgressSaved(ProgressSavedPayload { saved })
    }

    /// Creates a `SessionError` event.
    #[must_use]
    pub fn session_error(message: impl Into<String>) -> Self {
        Self::SessionError(SessionErrorPayload {
            message: message.into(),
        })
    }

    /// Returns the event name as a string.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Connected(_) => "connected",
            Self::ExerciseChecked(_) => "exercise_checked",
            Self::LessonCompleted(_) => "lesson_completed",
            Self::ProgressSaved(_) => "progress_saved",
            Self::SessionError(_) => "session_error",
        }
    }
}

// ============================================================================
// EventBroadcaster
// ============================================================================

/// Fan-out broadcaster for session events.
///
/// Wraps a `tokio::sync::broadcast` channel. Sending with no subscribers is
/// not an error; the event is simply dropped.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBroadcaster {
    /// Creates a broadcaster with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to the event stream.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    /// Broadcasts an event to all current subscribers.
    pub fn send(&self, event: SessionEvent) {
        let name = event.event_name();
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(event = name, receivers, "event broadcast");
            }
            Err(_) => {
                // No subscribers right now; nothing to deliver.
                tracing::trace!(event = name, "event dropped: no subscribers");
            }
        }
    }

    /// Number of currently subscribed receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
