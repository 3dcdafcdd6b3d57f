//! End-to-end session tests over the builtin catalog.
//!
//! These walk the public engine API the way the dashboard drives it:
//! selecting tutorials and lessons, checking submissions, and completing
//! lessons, with real JSON-file persistence where it matters.

use std::sync::Arc;

use school_engine::{
    Catalog, JsonFileStore, LessonSelection, LessonStatus, MemoryStore, ProgressTracker,
    SessionController, EXERCISE_BONUS, LESSON_BONUS,
};
use school_report::{LessonRow, LessonState, ProgressReport, TutorialBreakdown};

fn controller() -> SessionController {
    let catalog = Arc::new(Catalog::builtin().expect("builtin catalog must build"));
    let tracker =
        ProgressTracker::load_or_default(Box::new(MemoryStore::new())).expect("empty store loads");
    SessionController::new(catalog, tracker)
}

/// The attempt/score scenario from the progress contract, step by step.
#[test]
fn test_attempt_and_bonus_scenario() {
    let mut session = controller();
    session.select_tutorial("prompt-foundations").expect("tutorial exists");
    assert_eq!(
        session.select_lesson("clear-instructions").expect("lesson exists"),
        LessonSelection::Entered
    );
    session.start_exercise("sharpen-a-summary").expect("exercise exists");

    // Step 1: a failing attempt counts but awards nothing.
    let outcome = session.check().expect("check in exercise view");
    assert!(!outcome.verdict.success);
    assert_eq!(outcome.attempts, 1);
    assert!(session.progress().completed_exercises.is_empty());
    assert_eq!(session.progress().score, 0);

    // Step 2: the first success completes the exercise and awards 10.
    session
        .update_buffer(
            "Work through the report step by step and reply as a numbered list.".to_string(),
        )
        .expect("buffer update in exercise view");
    let outcome = session.check().expect("check in exercise view");
    assert!(outcome.verdict.success);
    assert_eq!(outcome.attempts, 2);
    assert!(outcome.newly_completed);
    assert_eq!(session.progress().score, EXERCISE_BONUS);
    assert!(session.progress().is_exercise_completed("sharpen-a-summary"));

    // Step 3: a repeat success counts the attempt and awards nothing new.
    let outcome = session.check().expect("check in exercise view");
    assert!(outcome.verdict.success);
    assert_eq!(outcome.attempts, 3);
    assert!(!outcome.newly_completed);
    assert_eq!(session.progress().score, EXERCISE_BONUS);
    assert_eq!(session.progress().completed_exercises.len(), 1);
}

/// The gating scenario: a lesson with unmet prerequisites is unreachable,
/// and unlocks the moment its prerequisite completes.
#[test]
fn test_prerequisite_gating_scenario() {
    let mut session = controller();
    session.select_tutorial("prompt-foundations").expect("tutorial exists");

    // Step 4: lesson B is locked while lesson A is incomplete.
    let before = session.state().clone();
    let selection = session.select_lesson("role-prompting").expect("lesson exists");
    assert_eq!(
        selection,
        LessonSelection::Locked {
            missing: vec!["clear-instructions".to_string()]
        }
    );
    assert_eq!(session.state(), &before, "refused transition must not mutate state");

    // Step 5: completing lesson A (+50) unlocks lesson B.
    session.select_lesson("clear-instructions").expect("lesson A is open");
    let outcome = session.mark_lesson_complete().expect("complete in lesson view");
    assert!(outcome.newly_completed);
    assert_eq!(session.progress().score, LESSON_BONUS);

    assert_eq!(
        session.select_lesson("role-prompting").expect("lesson exists"),
        LessonSelection::Entered
    );
}

/// Solving every exercise and completing every lesson in catalog order.
#[test]
fn test_full_course_walkthrough() {
    let catalog = Arc::new(Catalog::builtin().expect("builtin catalog must build"));
    let tracker =
        ProgressTracker::load_or_default(Box::new(MemoryStore::new())).expect("empty store loads");
    let mut session = SessionController::new(Arc::clone(&catalog), tracker);

    for tutorial in catalog.tutorials() {
        session.select_tutorial(&tutorial.id).expect("tutorial exists");

        for lesson in &tutorial.lessons {
            assert_eq!(
                session.select_lesson(&lesson.id).expect("lesson exists"),
                LessonSelection::Entered,
                "catalog order must satisfy prerequisites for '{}'",
                lesson.id
            );

            for exercise in &lesson.exercises {
                session.start_exercise(&exercise.id).expect("exercise exists");
                session
                    .update_buffer(exercise.solution.clone())
                    .expect("buffer update in exercise view");
                let outcome = session.check().expect("check in exercise view");
                assert!(
                    outcome.verdict.success,
                    "solution for '{}' must pass: {}",
                    exercise.id, outcome.verdict.message
                );
                assert!(outcome.newly_completed);
                session.close_exercise().expect("close in exercise view");
            }

            let outcome = session.mark_lesson_complete().expect("complete in lesson view");
            assert!(outcome.newly_completed);
        }

        session.return_to_catalog();
    }

    let progress = session.progress();
    let lessons = u32::try_from(catalog.lesson_count()).expect("small catalog");
    let exercises = u32::try_from(catalog.exercise_count()).expect("small catalog");

    assert_eq!(progress.completed_lessons.len(), catalog.lesson_count());
    assert_eq!(progress.completed_exercises.len(), catalog.exercise_count());
    assert_eq!(progress.score, lessons * LESSON_BONUS + exercises * EXERCISE_BONUS);
    assert_eq!(progress.total_attempts(), exercises);

    for tutorial in catalog.tutorials() {
        for lesson in &tutorial.lessons {
            assert_eq!(session.status_of(lesson), LessonStatus::Completed);
        }
    }
}

/// Progress written through a JSON file survives a restart.
#[test]
fn test_progress_survives_restart() {
    let dir = std::env::temp_dir().join("school_it_restart");
    std::fs::remove_dir_all(&dir).ok();
    let path = dir.join("progress.json");

    let catalog = Arc::new(Catalog::builtin().expect("builtin catalog must build"));

    // First session: complete a lesson and an exercise.
    {
        let tracker = ProgressTracker::load_or_default(Box::new(JsonFileStore::new(&path)))
            .expect("fresh store loads");
        let mut session = SessionController::new(Arc::clone(&catalog), tracker);

        session.select_tutorial("prompt-foundations").expect("tutorial exists");
        session.select_lesson("clear-instructions").expect("lesson is open");
        session.start_exercise("sharpen-a-summary").expect("exercise exists");
        session
            .update_buffer("Go step by step; answer with a numbered list.".to_string())
            .expect("buffer update");
        session.check().expect("check");
        session.close_exercise().expect("close");
        session.mark_lesson_complete().expect("complete");
    }

    // Second session: the state comes back from disk.
    {
        let tracker = ProgressTracker::load_or_default(Box::new(JsonFileStore::new(&path)))
            .expect("persisted store loads");
        let session = SessionController::new(Arc::clone(&catalog), tracker);

        let progress = session.progress();
        assert!(progress.is_lesson_completed("clear-instructions"));
        assert!(progress.is_exercise_completed("sharpen-a-summary"));
        assert_eq!(progress.attempts_for("sharpen-a-summary"), 1);
        assert_eq!(progress.score, LESSON_BONUS + EXERCISE_BONUS);

        // Gating reflects the restored state immediately.
        let lesson = catalog
            .lesson("prompt-foundations", "role-prompting")
            .expect("lesson exists");
        assert_eq!(session.status_of(lesson), LessonStatus::Available);
    }

    std::fs::remove_dir_all(&dir).ok();
}

/// The report crate agrees with the progress it is built from.
#[test]
fn test_report_agrees_with_progress() {
    let catalog = Catalog::builtin().expect("builtin catalog must build");
    let mut session = controller();

    session.select_tutorial("prompt-foundations").expect("tutorial exists");
    session.select_lesson("clear-instructions").expect("lesson is open");
    session.mark_lesson_complete().expect("complete");

    let progress = session.progress();
    let breakdowns: Vec<TutorialBreakdown> = catalog
        .tutorials()
        .iter()
        .map(|tutorial| {
            let rows = tutorial
                .lessons
                .iter()
                .map(|lesson| LessonRow {
                    lesson_id: lesson.id.clone(),
                    title: lesson.title.clone(),
                    status: match school_engine::lesson_status(lesson, progress) {
                        LessonStatus::Completed => LessonState::Completed,
                        LessonStatus::Available => LessonState::Available,
                        LessonStatus::Locked => LessonState::Locked,
                    },
                    exercises_completed: 0,
                    exercises_total: u32::try_from(lesson.exercises.len())
                        .expect("small catalog"),
                    attempts: 0,
                })
                .collect();
            TutorialBreakdown::new(
                tutorial.id.clone(),
                tutorial.title.clone(),
                tutorial.difficulty.to_string(),
                rows,
            )
        })
        .collect();

    let report = ProgressReport::new("it-learner", progress.score, 0, breakdowns);

    assert_eq!(report.summary.score, LESSON_BONUS);
    assert_eq!(report.summary.lessons_completed, 1);
    assert_eq!(report.summary.lessons_total, 5);
    assert_eq!(report.summary.exercises_total, 6);
    // One of three foundations lessons is done; the second unlocked.
    let foundations = &report.tutorials[0];
    assert_eq!(foundations.completion_percent, 33);
    assert_eq!(foundations.lessons[1].status, LessonState::Available);
    assert_eq!(foundations.lessons[2].status, LessonState::Locked);
}
