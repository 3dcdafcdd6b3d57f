//! Prompt School CLI
//!
//! Main entry point: wires local storage, the learner identity, the optional
//! remote store, and the HTTP API server, then writes progress reports on
//! shutdown.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use school_engine::{
    create_router, AppState, Catalog, Config, JsonFileStore, ProgressTracker, UserProgress,
};
use school_report::json::JsonGenerator;
use school_report::{LessonRow, LessonState, MarkdownGenerator, ProgressReport, TutorialBreakdown};
use school_sync::{LearnerId, RemoteStore};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// File name of the JSON progress report.
const REPORT_JSON: &str = "progress-report.json";

/// File name of the Markdown progress report.
const REPORT_MARKDOWN: &str = "progress-report.md";

/// Prompt School - Interactive Prompt-Engineering Tutorials
///
/// Serves the tutorial session API for the dashboard, persists learner
/// progress locally, and syncs profile/library records to a remote store
/// when one is configured.
#[derive(Parser, Debug)]
#[command(name = "promptschool")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: school.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Directory for local state (progress, learner identity)
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<String>,

    /// Output directory for progress reports
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Port for the HTTP API server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,

    /// Generate reports from persisted progress and exit without serving
    #[arg(long)]
    report_only: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize tracing subscriber with appropriate filter
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Prompt School starting");
    tracing::debug!(config = ?args.config, "Config file");
    tracing::debug!(output_dir = ?args.output_dir, "Output directory");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Runs the server (or report-only mode).
///
/// 1. Load config and apply CLI overrides
/// 2. Build the catalog and local storage
/// 3. Resolve the learner identity
/// 4. Optionally connect the remote store
/// 5. Serve the API until ctrl-c
/// 6. Write final progress reports
async fn run(args: Args) -> anyhow::Result<()> {
    // Load configuration
    let mut config = load_config(args.config.as_deref())?;

    // Apply CLI argument overrides
    if let Some(ref data_dir) = args.data_dir {
        config.data_dir.clone_from(data_dir);
    }
    if let Some(ref output_dir) = args.output_dir {
        config.output_dir.clone_from(output_dir);
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // Re-validate after overrides
    config.validate()?;

    // Build the catalog
    let catalog = Arc::new(Catalog::builtin()?);
    tracing::info!(
        tutorials = catalog.tutorials().len(),
        lessons = catalog.lesson_count(),
        exercises = catalog.exercise_count(),
        "catalog loaded"
    );

    // Resolve the learner identity (cached, or freshly generated)
    let learner = school_sync::load_or_generate(&config.identity_path())?;

    // Load persisted progress (or start empty)
    let store = JsonFileStore::new(config.progress_path());
    let tracker = ProgressTracker::load_or_default(Box::new(store))?;

    let output_dir = PathBuf::from(&config.output_dir);

    if args.report_only {
        let report = build_report(&catalog, tracker.progress(), &learner);
        write_reports(&report, &output_dir)?;
        print_summary(tracker.progress());
        return Ok(());
    }

    // Connect the remote store when configured
    let remote = build_remote(&config)?;

    // Start the HTTP API server
    let addr: SocketAddr = ([127, 0, 0, 1], config.port).into();
    let app_state = AppState::new(
        config.clone(),
        Arc::clone(&catalog),
        tracker,
        remote,
        learner.clone(),
    );
    let session = Arc::clone(&app_state.session);
    let router = create_router(app_state);

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!("Prompt School API running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Final reports from the progress as it stands at shutdown
    println!();
    println!("Shutting down...");
    let progress = session.lock().await.progress().clone();
    let report = build_report(&catalog, &progress, &learner);
    write_reports(&report, &output_dir)?;
    print_summary(&progress);

    Ok(())
}

/// Completes when the user requests shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
    }
}

/// Loads configuration from an explicit path or the working directory.
fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_file(Path::new(path))?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Builds the remote store client when credentials are configured.
fn build_remote(config: &Config) -> anyhow::Result<Option<Arc<RemoteStore>>> {
    let Some(url) = &config.remote.url else {
        tracing::info!("remote store not configured; record sync disabled");
        return Ok(None);
    };
    let Some(key) = &config.remote.key else {
        // validate() already rejects this combination; belt and braces.
        anyhow::bail!("remote store URL configured without an API key");
    };

    let store = RemoteStore::new(url, key, Duration::from_secs(config.remote.timeout_secs))?;
    tracing::info!(url = %url, "remote store sync enabled");
    Ok(Some(Arc::new(store)))
}

/// Builds the progress report from the catalog and the learner's progress.
fn build_report(catalog: &Catalog, progress: &UserProgress, learner: &LearnerId) -> ProgressReport {
    let tutorials = catalog
        .tutorials()
        .iter()
        .map(|tutorial| {
            let lessons = tutorial
                .lessons
                .iter()
                .map(|lesson| {
                    let completed = lesson
                        .exercises
                        .iter()
                        .filter(|e| progress.is_exercise_completed(&e.id))
                        .count();
                    let attempts = lesson
                        .exercises
                        .iter()
                        .map(|e| progress.attempts_for(&e.id))
                        .sum();

                    LessonRow {
                        lesson_id: lesson.id.clone(),
                        title: lesson.title.clone(),
                        status: lesson_state(lesson, progress),
                        exercises_completed: u32::try_from(completed).unwrap_or(u32::MAX),
                        exercises_total: u32::try_from(lesson.exercises.len())
                            .unwrap_or(u32::MAX),
                        attempts,
                    }
                })
                .collect();

            TutorialBreakdown::new(
                tutorial.id.clone(),
                tutorial.title.clone(),
                tutorial.difficulty.to_string(),
                lessons,
            )
        })
        .collect();

    ProgressReport::new(
        learner.as_str(),
        progress.score,
        progress.total_attempts(),
        tutorials,
    )
}

/// Maps the engine's derived lesson status onto the report's local copy.
fn lesson_state(lesson: &school_engine::Lesson, progress: &UserProgress) -> LessonState {
    match school_engine::lesson_status(lesson, progress) {
        school_engine::LessonStatus::Completed => LessonState::Completed,
        school_engine::LessonStatus::Available => LessonState::Available,
        school_engine::LessonStatus::Locked => LessonState::Locked,
    }
}

/// Writes JSON and Markdown reports into the output directory.
fn write_reports(report: &ProgressReport, output_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(output_dir)?;

    let json_path = output_dir.join(REPORT_JSON);
    JsonGenerator::new(report).write_to_file(&json_path, true)?;
    println!("Report written to {}", json_path.display());

    let markdown_path = output_dir.join(REPORT_MARKDOWN);
    MarkdownGenerator::new(report).write_to_file(&markdown_path)?;
    println!("Report written to {}", markdown_path.display());

    Ok(())
}

/// Prints a short progress summary to stdout.
fn print_summary(progress: &UserProgress) {
    println!();
    println!("=== Progress Summary ===");
    println!("Score:               {}", progress.score);
    println!("Lessons completed:   {}", progress.completed_lessons.len());
    println!("Exercises completed: {}", progress.completed_exercises.len());
    println!("Total attempts:      {}", progress.total_attempts());
}
