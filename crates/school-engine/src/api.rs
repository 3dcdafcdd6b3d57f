//! HTTP API for the Prompt School dashboard.
//!
//! The dashboard is a thin consumer: every state transition of the session
//! machine has a route, plus read-only views of the catalog and progress and
//! a WebSocket event stream.
//!
//! # Endpoints
//!
//! - `GET  /api/catalog` - the content catalog (rules and solutions omitted)
//! - `GET  /api/session` - current session view
//! - `GET  /api/progress` - current progress snapshot
//! - `POST /api/session/tutorial` - select a tutorial
//! - `POST /api/session/lesson` - enter a lesson (gated)
//! - `POST /api/session/exercise` - open an exercise
//! - `POST /api/session/buffer` - replace the submission buffer
//! - `POST /api/session/check` - validate the buffer
//! - `POST /api/session/hint` - reveal the next hint
//! - `POST /api/session/exercise/close` - back to the lesson
//! - `POST /api/session/lesson/complete` - complete the lesson
//! - `POST /api/session/catalog` - back to the catalog
//! - `GET/PUT /api/records/{profile,learning-entries,workflows,prompts,device-config}`
//!   - remote-store CRUD, scoped to this device's learner
//! - `GET  /ws` - WebSocket event stream
//!
//! Expected refusals (a gated lesson) are `200` with `entered: false`;
//! wrong-state operations are `409`; unknown identifiers are `404`; remote
//! store failures surface as `saved`/`loaded` set to `false`.

use std::sync::Arc;

use axum::{
    extract::ws::{Message, WebSocket},
    extract::{State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use school_sync::{
    DeviceConfig, LearnerId, LearningEntry, Profile, PromptRecord, RemoteStore, WorkflowRecord,
};

use crate::catalog::{Catalog, Difficulty, Exercise, Lesson, Tutorial, WorkedExample};
use crate::config::Config;
use crate::error::EngineError;
use crate::events::{EventBroadcaster, SessionEvent};
use crate::progress::{AttemptOutcome, LessonOutcome, ProgressTracker, UserProgress};
use crate::session::{LessonSelection, SessionController, SessionState};
use crate::validate::Verdict;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Engine configuration.
    pub config: Config,
    /// The immutable content catalog.
    pub catalog: Arc<Catalog>,
    /// The learner's session, serialized behind one lock.
    pub session: Arc<Mutex<SessionController>>,
    /// Event fan-out for WebSocket clients.
    pub broadcaster: EventBroadcaster,
    /// Remote store client, absent when sync is not configured.
    pub remote: Option<Arc<RemoteStore>>,
    /// The identity scoping all remote records.
    pub learner: LearnerId,
}

impl AppState {
    /// Creates the application state, wiring the session controller over the
    /// given catalog and tracker.
    #[must_use]
    pub fn new(
        config: Config,
        catalog: Arc<Catalog>,
        tracker: ProgressTracker,
        remote: Option<Arc<RemoteStore>>,
        learner: LearnerId,
    ) -> Self {
        let session = SessionController::new(Arc::clone(&catalog), tracker);
        Self {
            config,
            catalog,
            session: Arc::new(Mutex::new(session)),
            broadcaster: EventBroadcaster::default(),
            remote,
            learner,
        }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// A requested entity does not exist.
    NotFound(String),
    /// The session is in a state that does not permit this operation.
    WrongState(String),
    /// A required subsystem is not configured or available.
    Unavailable(String),
    /// Anything else.
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        if err.is_not_found() {
            Self::NotFound(err.to_string())
        } else if err.is_wrong_state() {
            Self::WrongState(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::WrongState(msg) => (StatusCode::CONFLICT, msg),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

// ============================================================================
// Catalog Views
// ============================================================================

/// Serializable view of the whole catalog.
///
/// Validation rules and reference solutions never leave the server; the
/// exercise view carries only what the dashboard renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogView {
    /// All tutorials in catalog order.
    pub tutorials: Vec<TutorialView>,
}

/// Serializable view of one tutorial.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorialView {
    /// Tutorial identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// One-line summary.
    pub description: String,
    /// Difficulty rating.
    pub difficulty: Difficulty,
    /// Estimated duration in minutes.
    pub duration_minutes: u32,
    /// Lessons in learning order.
    pub lessons: Vec<LessonView>,
}

/// Serializable view of one lesson.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonView {
    /// Lesson identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// One-line summary.
    pub description: String,
    /// Estimated duration in minutes.
    pub duration_minutes: u32,
    /// Concept tags.
    pub concepts: Vec<String>,
    /// Theory text (markdown).
    pub theory: String,
    /// Worked examples.
    pub examples: Vec<WorkedExample>,
    /// Prerequisite lesson identifiers.
    pub prerequisites: Vec<String>,
    /// Exercises in order.
    pub exercises: Vec<ExerciseView>,
}

/// Serializable view of one exercise.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseView {
    /// Exercise identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// The task statement.
    pub description: String,
    /// Initial buffer contents.
    pub starter_code: String,
    /// How many hints are available.
    pub hint_count: usize,
}

impl From<&Exercise> for ExerciseView {
    fn from(exercise: &Exercise) -> Self {
        Self {
            id: exercise.id.clone(),
            title: exercise.title.clone(),
            description: exercise.description.clone(),
            starter_code: exercise.starter_code.clone(),
            hint_count: exercise.hints.len(),
        }
    }
}

impl From<&Lesson> for LessonView {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id.clone(),
            title: lesson.title.clone(),
            description: lesson.description.clone(),
            duration_minutes: lesson.duration_minutes,
            concepts: lesson.concepts.clone(),
            theory: lesson.theory.clone(),
            examples: lesson.examples.clone(),
            prerequisites: lesson.prerequisites.clone(),
            exercises: lesson.exercises.iter().map(ExerciseView::from).collect(),
        }
    }
}

impl From<&Tutorial> for TutorialView {
    fn from(tutorial: &Tutorial) -> Self {
        Self {
            id: tutorial.id.clone(),
            title: tutorial.title.clone(),
            description: tutorial.description.clone(),
            difficulty: tutorial.difficulty,
            duration_minutes: tutorial.duration_minutes,
            lessons: tutorial.lessons.iter().map(LessonView::from).collect(),
        }
    }
}

// ============================================================================
// Session Views and Request/Response Types
// ============================================================================

/// Derived status row for one lesson of the current tutorial.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonStatusRow {
    /// Lesson identifier.
    pub lesson_id: String,
    /// Derived display status.
    pub status: crate::session::LessonStatus,
    /// Prerequisites still missing, empty unless locked.
    pub missing_prerequisites: Vec<String>,
}

/// The session as the dashboard renders it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Session state name.
    pub state: String,
    /// Selected tutorial, if any.
    pub tutorial_id: Option<String>,
    /// Current lesson, if any.
    pub lesson_id: Option<String>,
    /// Open exercise, if any.
    pub exercise_id: Option<String>,
    /// Submission buffer of the open exercise.
    pub buffer: Option<String>,
    /// Most recent verdict of the open exercise.
    pub verdict: Option<Verdict>,
    /// Hints revealed so far for the open exercise.
    pub revealed_hints: Vec<String>,
    /// Status rows for the current tutorial's lessons.
    pub lessons: Vec<LessonStatusRow>,
    /// Cumulative score.
    pub score: u32,
}

/// Request body for selecting a tutorial.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectTutorialRequest {
    /// The tutorial to select.
    pub tutorial_id: String,
}

/// Response body for selecting a tutorial.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectTutorialResponse {
    /// Always `true` on success.
    pub selected: bool,
    /// The tutorial's first lesson, now current.
    pub lesson_id: String,
}

/// Request body for entering a lesson.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectLessonRequest {
    /// The lesson to enter.
    pub lesson_id: String,
}

/// Response body for entering a lesson.
///
/// A refusal is not an error: `entered` is `false` and the missing
/// prerequisites are listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectLessonResponse {
    /// Whether the session moved into the lesson.
    pub entered: bool,
    /// Prerequisites still missing when refused.
    pub missing_prerequisites: Vec<String>,
}

/// Request body for opening an exercise.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExerciseRequest {
    /// The exercise to open.
    pub exercise_id: String,
}

/// Response body for opening an exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExerciseResponse {
    /// Always `true` on success.
    pub started: bool,
    /// The buffer, seeded from starter code.
    pub buffer: String,
}

/// Request body for replacing the submission buffer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBufferRequest {
    /// The new buffer contents.
    pub buffer: String,
}

/// Response body for replacing the submission buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBufferResponse {
    /// Always `true` on success.
    pub updated: bool,
}

/// Response body for revealing a hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintResponse {
    /// Number of hints revealed after this call.
    pub hints_revealed: usize,
    /// The revealed hints, in order.
    pub hints: Vec<String>,
}

/// Response body for closing an exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseExerciseResponse {
    /// Always `true` on success.
    pub closed: bool,
}

/// Response body for returning to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnToCatalogResponse {
    /// Always `true`.
    pub returned: bool,
}

/// Response body for record-collection reads.
///
/// `loaded: false` means the remote call failed (already logged); the
/// records list is empty in that case and the dashboard decides how to warn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsResponse<T> {
    /// Whether the remote fetch succeeded.
    pub loaded: bool,
    /// The fetched records, newest first.
    pub records: Vec<T>,
}

/// Response body for singleton-record reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingletonResponse<T> {
    /// Whether the remote fetch succeeded.
    pub loaded: bool,
    /// The record, absent when none is stored (or the fetch failed).
    pub record: Option<T>,
}

/// Request body for record-collection writes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecordsRequest<T> {
    /// The full collection to store (replace-all).
    pub records: Vec<T>,
}

/// Request body for singleton-record writes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSingletonRequest<T> {
    /// The record to upsert.
    pub record: T,
}

/// Response body for record writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    /// Whether the remote write succeeded.
    pub saved: bool,
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// The router carries CORS middleware (permissive, for dashboard
/// development) and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/catalog", get(handle_get_catalog))
        .route("/session", get(handle_get_session))
        .route("/progress", get(handle_get_progress))
        .route("/session/tutorial", post(handle_select_tutorial))
        .route("/session/lesson", post(handle_select_lesson))
        .route("/session/exercise", post(handle_start_exercise))
        .route("/session/buffer", post(handle_update_buffer))
        .route("/session/check", post(handle_check))
        .route("/session/hint", post(handle_reveal_hint))
        .route("/session/exercise/close", post(handle_close_exercise))
        .route("/session/lesson/complete", post(handle_complete_lesson))
        .route("/session/catalog", post(handle_return_to_catalog))
        .route(
            "/records/profile",
            get(handle_get_profile).put(handle_put_profile),
        )
        .route(
            "/records/learning-entries",
            get(handle_get_learning_entries).put(handle_put_learning_entries),
        )
        .route(
            "/records/workflows",
            get(handle_get_workflows).put(handle_put_workflows),
        )
        .route(
            "/records/prompts",
            get(handle_get_prompts).put(handle_put_prompts),
        )
        .route(
            "/records/device-config",
            get(handle_get_device_config).put(handle_put_device_config),
        );

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handle_ws))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Session Handlers
// ============================================================================

/// Handler for `GET /api/catalog`.
async fn handle_get_catalog(State(state): State<Arc<AppState>>) -> Json<CatalogView> {
    let tutorials = state
        .catalog
        .tutorials()
        .iter()
        .map(TutorialView::from)
        .collect();
    Json(CatalogView { tutorials })
}

/// Handler for `GET /api/session`.
async fn handle_get_session(State(state): State<Arc<AppState>>) -> Json<SessionView> {
    let session = state.session.lock().await;
    Json(session_view(&session))
}

/// Handler for `GET /api/progress`.
async fn handle_get_progress(State(state): State<Arc<AppState>>) -> Json<UserProgress> {
    let session = state.session.lock().await;
    Json(session.progress().clone())
}

/// Handler for `POST /api/session/tutorial`.
async fn handle_select_tutorial(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectTutorialRequest>,
) -> Result<Json<SelectTutorialResponse>, ApiError> {
    let mut session = state.session.lock().await;
    session.select_tutorial(&request.tutorial_id)?;

    let lesson_id = session
        .current_lesson()
        .map(|l| l.id.clone())
        .unwrap_or_default();

    info!(tutorial_id = %request.tutorial_id, %lesson_id, "tutorial selected");
    Ok(Json(SelectTutorialResponse {
        selected: true,
        lesson_id,
    }))
}

/// Handler for `POST /api/session/lesson`.
///
/// A locked lesson is an expected refusal: `200` with `entered: false`.
async fn handle_select_lesson(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SelectLessonRequest>,
) -> Result<Json<SelectLessonResponse>, ApiError> {
    let mut session = state.session.lock().await;

    match session.select_lesson(&request.lesson_id)? {
        LessonSelection::Entered => {
            info!(lesson_id = %request.lesson_id, "lesson entered");
            Ok(Json(SelectLessonResponse {
                entered: true,
                missing_prerequisites: vec![],
            }))
        }
        LessonSelection::Locked { missing } => {
            info!(lesson_id = %request.lesson_id, ?missing, "lesson locked");
            Ok(Json(SelectLessonResponse {
                entered: false,
                missing_prerequisites: missing,
            }))
        }
    }
}

/// Handler for `POST /api/session/exercise`.
async fn handle_start_exercise(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartExerciseRequest>,
) -> Result<Json<StartExerciseResponse>, ApiError> {
    let mut session = state.session.lock().await;
    session.start_exercise(&request.exercise_id)?;

    let buffer = match session.state() {
        SessionState::ExerciseActive { buffer, .. } => buffer.clone(),
        _ => String::new(),
    };

    Ok(Json(StartExerciseResponse {
        started: true,
        buffer,
    }))
}

/// Handler for `POST /api/session/buffer`.
async fn handle_update_buffer(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateBufferRequest>,
) -> Result<Json<UpdateBufferResponse>, ApiError> {
    let mut session = state.session.lock().await;
    session.update_buffer(request.buffer)?;
    Ok(Json(UpdateBufferResponse { updated: true }))
}

/// Handler for `POST /api/session/check`.
async fn handle_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AttemptOutcome>, ApiError> {
    let outcome = {
        let mut session = state.session.lock().await;
        session.check()?
    };

    if !outcome.saved {
        warn!(exercise_id = %outcome.exercise_id, "progress write failed after check");
    }
    state
        .broadcaster
        .send(SessionEvent::exercise_checked(&outcome));
    state
        .broadcaster
        .send(SessionEvent::progress_saved(outcome.saved));

    Ok(Json(outcome))
}

/// Handler for `POST /api/session/hint`.
async fn handle_reveal_hint(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HintResponse>, ApiError> {
    let mut session = state.session.lock().await;
    let hints_revealed = session.reveal_next_hint()?;
    let hints = session.revealed_hints().to_vec();

    Ok(Json(HintResponse {
        hints_revealed,
        hints,
    }))
}

/// Handler for `POST /api/session/exercise/close`.
async fn handle_close_exercise(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CloseExerciseResponse>, ApiError> {
    let mut session = state.session.lock().await;
    session.close_exercise()?;
    Ok(Json(CloseExerciseResponse { closed: true }))
}

/// Handler for `POST /api/session/lesson/complete`.
async fn handle_complete_lesson(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LessonOutcome>, ApiError> {
    let outcome = {
        let mut session = state.session.lock().await;
        session.mark_lesson_complete()?
    };

    if !outcome.saved {
        warn!(lesson_id = %outcome.lesson_id, "progress write failed after lesson completion");
    }
    state
        .broadcaster
        .send(SessionEvent::lesson_completed(&outcome));
    state
        .broadcaster
        .send(SessionEvent::progress_saved(outcome.saved));

    Ok(Json(outcome))
}

/// Handler for `POST /api/session/catalog`.
async fn handle_return_to_catalog(
    State(state): State<Arc<AppState>>,
) -> Json<ReturnToCatalogResponse> {
    let mut session = state.session.lock().await;
    session.return_to_catalog();
    Json(ReturnToCatalogResponse { returned: true })
}

/// Builds the dashboard's session view under the session lock.
fn session_view(session: &SessionController) -> SessionView {
    let progress = session.progress();
    let lessons = session
        .current_tutorial()
        .map(|tutorial| {
            tutorial
                .lessons
                .iter()
                .map(|lesson| LessonStatusRow {
                    lesson_id: lesson.id.clone(),
                    status: crate::session::lesson_status(lesson, progress),
                    missing_prerequisites: crate::session::missing_prerequisites(
                        lesson, progress,
                    ),
                })
                .collect()
        })
        .unwrap_or_default();

    let (tutorial_id, lesson_id, exercise_id, buffer, verdict) = match session.state() {
        SessionState::Catalog => (None, None, None, None, None),
        SessionState::TutorialSelected {
            tutorial_id,
            lesson_id,
        }
        | SessionState::LessonActive {
            tutorial_id,
            lesson_id,
        } => (
            Some(tutorial_id.clone()),
            Some(lesson_id.clone()),
            None,
            None,
            None,
        ),
        SessionState::ExerciseActive {
            tutorial_id,
            lesson_id,
            exercise_id,
            buffer,
            verdict,
            ..
        } => (
            Some(tutorial_id.clone()),
            Some(lesson_id.clone()),
            Some(exercise_id.clone()),
            Some(buffer.clone()),
            verdict.clone(),
        ),
    };

    SessionView {
        state: session.state().name().to_string(),
        tutorial_id,
        lesson_id,
        exercise_id,
        buffer,
        verdict,
        revealed_hints: session.revealed_hints().to_vec(),
        lessons,
        score: progress.score,
    }
}

// ============================================================================
// Record Handlers (remote store)
// ============================================================================

fn remote_or_unavailable(state: &AppState) -> Result<Arc<RemoteStore>, ApiError> {
    state.remote.clone().ok_or_else(|| {
        ApiError::Unavailable(
            "remote store is not configured (set SCHOOL_STORE_URL and SCHOOL_STORE_KEY)"
                .to_string(),
        )
    })
}

/// Handler for `GET /api/records/profile`.
async fn handle_get_profile(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SingletonResponse<Profile>>, ApiError> {
    let remote = remote_or_unavailable(&state)?;
    match remote.fetch_profile(&state.learner).await {
        Ok(record) => Ok(Json(SingletonResponse {
            loaded: true,
            record,
        })),
        Err(_) => Ok(Json(SingletonResponse {
            loaded: false,
            record: None,
        })),
    }
}

/// Handler for `PUT /api/records/profile`.
async fn handle_put_profile(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveSingletonRequest<Profile>>,
) -> Result<Json<SaveResponse>, ApiError> {
    let remote = remote_or_unavailable(&state)?;
    let saved = remote
        .upsert_profile(&state.learner, &request.record)
        .await
        .is_ok();
    Ok(Json(SaveResponse { saved }))
}

/// Handler for `GET /api/records/learning-entries`.
async fn handle_get_learning_entries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecordsResponse<LearningEntry>>, ApiError> {
    let remote = remote_or_unavailable(&state)?;
    match remote.fetch_learning_entries(&state.learner).await {
        Ok(records) => Ok(Json(RecordsResponse {
            loaded: true,
            records,
        })),
        Err(_) => Ok(Json(RecordsResponse {
            loaded: false,
            records: vec![],
        })),
    }
}

/// Handler for `PUT /api/records/learning-entries`.
async fn handle_put_learning_entries(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveRecordsRequest<LearningEntry>>,
) -> Result<Json<SaveResponse>, ApiError> {
    let remote = remote_or_unavailable(&state)?;
    let saved = remote
        .replace_learning_entries(&state.learner, &request.records)
        .await
        .is_ok();
    Ok(Json(SaveResponse { saved }))
}

/// Handler for `GET /api/records/workflows`.
async fn handle_get_workflows(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecordsResponse<WorkflowRecord>>, ApiError> {
    let remote = remote_or_unavailable(&state)?;
    match remote.fetch_workflows(&state.learner).await {
        Ok(records) => Ok(Json(RecordsResponse {
            loaded: true,
            records,
        })),
        Err(_) => Ok(Json(RecordsResponse {
            loaded: false,
            records: vec![],
        })),
    }
}

/// Handler for `PUT /api/records/workflows`.
async fn handle_put_workflows(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveRecordsRequest<WorkflowRecord>>,
) -> Result<Json<SaveResponse>, ApiError> {
    let remote = remote_or_unavailable(&state)?;
    let saved = remote
        .replace_workflows(&state.learner, &request.records)
        .await
        .is_ok();
    Ok(Json(SaveResponse { saved }))
}

/// Handler for `GET /api/records/prompts`.
async fn handle_get_prompts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RecordsResponse<PromptRecord>>, ApiError> {
    let remote = remote_or_unavailable(&state)?;
    match remote.fetch_prompts(&state.learner).await {
        Ok(records) => Ok(Json(RecordsResponse {
            loaded: true,
            records,
        })),
        Err(_) => Ok(Json(RecordsResponse {
            loaded: false,
            records: vec![],
        })),
    }
}

/// Handler for `PUT /api/records/prompts`.
async fn handle_put_prompts(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveRecordsRequest<PromptRecord>>,
) -> Result<Json<SaveResponse>, ApiError> {
    let remote = remote_or_unavailable(&state)?;
    let saved = remote
        .replace_prompts(&state.learner, &request.records)
        .await
        .is_ok();
    Ok(Json(SaveResponse { saved }))
}

/// Handler for `GET /api/records/device-config`.
async fn handle_get_device_config(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SingletonResponse<DeviceConfig>>, ApiError> {
    let remote = remote_or_unavailable(&state)?;
    match remote.fetch_device_config(&state.learner).await {
        Ok(record) => Ok(Json(SingletonResponse {
            loaded: true,
            record,
        })),
        Err(_) => Ok(Json(SingletonResponse {
            loaded: false,
            record: None,
        })),
    }
}

/// Handler for `PUT /api/records/device-config`.
async fn handle_put_device_config(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveSingletonRequest<DeviceConfig>>,
) -> Result<Json<SaveResponse>, ApiError> {
    let remote = remote_or_unavailable(&state)?;
    let saved = remote
        .upsert_device_config(&state.learner, &request.record)
        .await
        .is_ok();
    Ok(Json(SaveResponse { saved }))
}

// ============================================================================
// WebSocket Handler
// ============================================================================

/// Handler for `GET /ws`.
async fn handle_ws(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Forwards broadcast events to one WebSocket client.
async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut receiver = state.broadcaster.subscribe();

    // Greet the client with the current progress so late joiners can render.
    let progress = state.session.lock().await.progress().clone();
    let connected = SessionEvent::connected(progress);
    match serde_json::to_string(&connected) {
        Ok(text) => {
            if socket.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        Err(e) => {
            warn!(error = %e, "failed to serialize connected event");
            return;
        }
    }

    loop {
        tokio::select! {
            event = receiver.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagged; events dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {
                    // Clients only listen; ignore anything they send.
                }
                Some(Err(e)) => {
                    tracing::debug!(error = %e, "websocket receive error");
                    break;
                }
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
