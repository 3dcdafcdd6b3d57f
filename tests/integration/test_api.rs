//! Integration tests for the HTTP API and WebSocket event stream.
//!
//! These run a real server on an ephemeral port and drive it with an HTTP
//! client, the way the dashboard does.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use school_engine::{
    create_router, AppState, Catalog, Config, MemoryStore, ProgressTracker, EXERCISE_BONUS,
};
use school_sync::LearnerId;
use tokio_tungstenite::tungstenite::Message;

/// Spawns the API server on an ephemeral port, returning its address.
async fn spawn_server() -> SocketAddr {
    let catalog = Arc::new(Catalog::builtin().expect("builtin catalog must build"));
    let tracker =
        ProgressTracker::load_or_default(Box::new(MemoryStore::new())).expect("empty store loads");
    let state = AppState::new(
        Config::default(),
        catalog,
        tracker,
        None,
        LearnerId::from_issued("api-test-learner"),
    );
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("test server error: {e}");
        }
    });

    addr
}

async fn post(
    client: &reqwest::Client,
    addr: SocketAddr,
    path: &str,
    body: serde_json::Value,
) -> reqwest::Response {
    client
        .post(format!("http://{addr}{path}"))
        .json(&body)
        .send()
        .await
        .expect("request succeeds")
}

/// Receives the next WebSocket text frame as parsed JSON, with a timeout.
async fn next_event(
    ws: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin),
) -> serde_json::Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("event within timeout")
            .expect("stream open")
            .expect("frame readable");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).expect("event is JSON");
        }
    }
}

#[tokio::test]
async fn test_catalog_and_session_over_http() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let catalog: serde_json::Value = client
        .get(format!("http://{addr}/api/catalog"))
        .send()
        .await
        .expect("request succeeds")
        .json()
        .await
        .expect("catalog is JSON");

    let tutorials = catalog["tutorials"].as_array().expect("tutorials array");
    assert_eq!(tutorials.len(), 2);
    assert_eq!(tutorials[0]["id"], "prompt-foundations");

    let response = post(
        &client,
        addr,
        "/api/session/tutorial",
        serde_json::json!({"tutorialId": "prompt-foundations"}),
    )
    .await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    let session: serde_json::Value = client
        .get(format!("http://{addr}/api/session"))
        .send()
        .await
        .expect("request succeeds")
        .json()
        .await
        .expect("session is JSON");
    assert_eq!(session["state"], "tutorial_selected");
    assert_eq!(session["lessonId"], "clear-instructions");
}

#[tokio::test]
async fn test_refusals_conflicts_and_not_found_over_http() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    // Wrong state: checking from the catalog view is a conflict.
    let response = post(&client, addr, "/api/session/check", serde_json::json!({})).await;
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);

    // Unknown tutorial is a 404.
    let response = post(
        &client,
        addr,
        "/api/session/tutorial",
        serde_json::json!({"tutorialId": "missing"}),
    )
    .await;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    // A gated lesson is a 200 refusal, not an error.
    post(
        &client,
        addr,
        "/api/session/tutorial",
        serde_json::json!({"tutorialId": "prompt-foundations"}),
    )
    .await;
    let response = post(
        &client,
        addr,
        "/api/session/lesson",
        serde_json::json!({"lessonId": "few-shot-examples"}),
    )
    .await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.expect("refusal body");
    assert_eq!(body["entered"], false);
    assert_eq!(body["missingPrerequisites"], serde_json::json!(["role-prompting"]));
}

#[tokio::test]
async fn test_websocket_streams_session_events() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("websocket connects");

    // The greeting carries current progress.
    let connected = next_event(&mut ws).await;
    assert_eq!(connected["event"], "connected");
    assert_eq!(connected["payload"]["progress"]["score"], 0);

    // Drive a passing check over HTTP.
    post(
        &client,
        addr,
        "/api/session/tutorial",
        serde_json::json!({"tutorialId": "prompt-foundations"}),
    )
    .await;
    post(
        &client,
        addr,
        "/api/session/lesson",
        serde_json::json!({"lessonId": "clear-instructions"}),
    )
    .await;
    post(
        &client,
        addr,
        "/api/session/exercise",
        serde_json::json!({"exerciseId": "sharpen-a-summary"}),
    )
    .await;
    post(
        &client,
        addr,
        "/api/session/buffer",
        serde_json::json!({"buffer": "Go step by step, then give me a numbered list."}),
    )
    .await;
    let response = post(&client, addr, "/api/session/check", serde_json::json!({})).await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);

    // The check arrives as an event pair, in order.
    let checked = next_event(&mut ws).await;
    assert_eq!(checked["event"], "exercise_checked");
    assert_eq!(checked["payload"]["exerciseId"], "sharpen-a-summary");
    assert_eq!(checked["payload"]["success"], true);
    assert_eq!(checked["payload"]["newlyCompleted"], true);
    assert_eq!(checked["payload"]["score"], u64::from(EXERCISE_BONUS));

    let saved = next_event(&mut ws).await;
    assert_eq!(saved["event"], "progress_saved");
    assert_eq!(saved["payload"]["saved"], true);

    // Completing the lesson is observed too.
    let response = post(
        &client,
        addr,
        "/api/session/exercise/close",
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    post(
        &client,
        addr,
        "/api/session/lesson/complete",
        serde_json::json!({}),
    )
    .await;

    let completed = next_event(&mut ws).await;
    assert_eq!(completed["event"], "lesson_completed");
    assert_eq!(completed["payload"]["lessonId"], "clear-instructions");
    assert_eq!(completed["payload"]["newlyCompleted"], true);

    ws.send(Message::Close(None)).await.ok();
}

#[tokio::test]
async fn test_two_websocket_clients_both_hear_events() {
    let addr = spawn_server().await;
    let client = reqwest::Client::new();

    let (mut first, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("first client connects");
    let (mut second, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("second client connects");

    assert_eq!(next_event(&mut first).await["event"], "connected");
    assert_eq!(next_event(&mut second).await["event"], "connected");

    post(
        &client,
        addr,
        "/api/session/tutorial",
        serde_json::json!({"tutorialId": "structured-agents"}),
    )
    .await;
    post(
        &client,
        addr,
        "/api/session/lesson",
        serde_json::json!({"lessonId": "output-contracts"}),
    )
    .await;
    post(
        &client,
        addr,
        "/api/session/lesson/complete",
        serde_json::json!({}),
    )
    .await;

    for ws in [&mut first, &mut second] {
        let event = next_event(ws).await;
        assert_eq!(event["event"], "lesson_completed");
        assert_eq!(event["payload"]["lessonId"], "output-contracts");
    }
}
