//! Prompt School Engine
//!
//! Content catalog, exercise validation, progress tracking, the tutorial
//! session state machine, and the HTTP/WebSocket API the dashboard consumes.

pub mod api;
pub mod catalog;
pub mod config;
mod content;
pub mod error;
pub mod events;
pub mod progress;
pub mod session;
pub mod validate;

pub use api::{create_router, AppState, CatalogView, ErrorResponse, SessionView};
pub use catalog::{Catalog, Difficulty, Exercise, Lesson, Tutorial, WorkedExample};
pub use config::{Config, RemoteConfig, STORE_KEY_ENV, STORE_URL_ENV};
pub use error::{EngineError, Result};
pub use events::{EventBroadcaster, SessionEvent};
pub use progress::{
    AttemptOutcome, JsonFileStore, LessonOutcome, MemoryStore, ProgressStore, ProgressTracker,
    UserProgress, EXERCISE_BONUS, LESSON_BONUS, PROGRESS_VERSION,
};
pub use session::{
    lesson_status, missing_prerequisites, LessonSelection, LessonStatus, SessionController,
    SessionState,
};
pub use validate::{Requirement, ValidationRule, Verdict};
