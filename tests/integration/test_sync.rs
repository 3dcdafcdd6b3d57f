//! Integration tests for the remote-store sync layer.
//!
//! An in-process axum server stands in for the remote store, speaking just
//! enough of its REST dialect (filter/order query parameters, upsert
//! headers) to exercise the client's contract: round-trips, replace-all
//! atomicity, empty results, and failure surfacing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, TimeZone, Utc};
use school_sync::{
    DeviceConfig, LearnerId, LearningEntry, Profile, PromptRecord, RemoteStore, SyncError,
    WorkflowRecord,
};

// ============================================================================
// Stub remote store
// ============================================================================

/// In-memory tables, plus a switch that makes deletes fail.
#[derive(Clone, Default)]
struct StubStore {
    tables: Arc<Mutex<HashMap<String, Vec<serde_json::Value>>>>,
    fail_deletes: Arc<AtomicBool>,
}

impl StubStore {
    fn rows(&self, table: &str) -> Vec<serde_json::Value> {
        self.tables
            .lock()
            .expect("stub lock")
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

fn learner_filter(params: &HashMap<String, String>) -> String {
    params
        .get("learner_id")
        .and_then(|v| v.strip_prefix("eq."))
        .unwrap_or_default()
        .to_string()
}

async fn stub_fetch(
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(store): State<StubStore>,
) -> Json<Vec<serde_json::Value>> {
    let learner = learner_filter(&params);
    let mut rows: Vec<serde_json::Value> = store
        .rows(&table)
        .into_iter()
        .filter(|row| row["learner_id"] == learner)
        .collect();

    if params.get("order").is_some_and(|o| o == "updated_at.desc") {
        rows.sort_by(|a, b| {
            let at = |row: &serde_json::Value| row["updated_at"].as_str().map(str::to_string);
            at(b).cmp(&at(a))
        });
    }

    Json(rows)
}

async fn stub_delete(
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(store): State<StubStore>,
) -> StatusCode {
    if store.fail_deletes.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let learner = learner_filter(&params);
    let mut tables = store.tables.lock().expect("stub lock");
    if let Some(rows) = tables.get_mut(&table) {
        rows.retain(|row| row["learner_id"] != learner);
    }
    StatusCode::NO_CONTENT
}

async fn stub_insert(
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    State(store): State<StubStore>,
    Json(incoming): Json<Vec<serde_json::Value>>,
) -> StatusCode {
    let upsert_on_learner = params.get("on_conflict").is_some_and(|c| c == "learner_id");
    let mut tables = store.tables.lock().expect("stub lock");
    let rows = tables.entry(table).or_default();

    for row in incoming {
        if upsert_on_learner {
            rows.retain(|existing| existing["learner_id"] != row["learner_id"]);
        }
        rows.push(row);
    }
    StatusCode::CREATED
}

/// Spawns the stub store, returning its address and state handle.
async fn spawn_stub() -> (SocketAddr, StubStore) {
    let store = StubStore::default();
    let router = Router::new()
        .route(
            "/rest/v1/:table",
            get(stub_fetch).delete(stub_delete).post(stub_insert),
        )
        .with_state(store.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("stub store error: {e}");
        }
    });

    (addr, store)
}

fn client_for(addr: SocketAddr) -> RemoteStore {
    RemoteStore::new(format!("http://{addr}"), "test-key", Duration::from_secs(5))
        .expect("valid stub URL")
}

fn when(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, hour, 0, 0).single().expect("valid timestamp")
}

fn prompt(id: &str, hour: u32) -> PromptRecord {
    PromptRecord {
        id: id.to_string(),
        title: format!("Prompt {id}"),
        body: "Think step by step.".to_string(),
        tags: vec!["library".to_string()],
        updated_at: when(hour),
    }
}

// ============================================================================
// Tests
// ============================================================================

/// Round-trip law: save then fetch returns what was saved.
#[tokio::test]
async fn test_replace_then_fetch_roundtrips() {
    let (addr, _store) = spawn_stub().await;
    let client = client_for(addr);
    let learner = LearnerId::from_issued("learner-1");

    let saved = vec![prompt("p1", 9), prompt("p2", 11)];
    client
        .replace_prompts(&learner, &saved)
        .await
        .expect("replace succeeds");

    let fetched = client.fetch_prompts(&learner).await.expect("fetch succeeds");
    assert_eq!(fetched.len(), 2);
    // Recency ordering: p2 (11:00) before p1 (09:00).
    assert_eq!(fetched[0], saved[1]);
    assert_eq!(fetched[1], saved[0]);
}

/// Fetching a learner with no records is empty, never an error.
#[tokio::test]
async fn test_fetch_unknown_learner_is_empty() {
    let (addr, _store) = spawn_stub().await;
    let client = client_for(addr);

    let fetched = client
        .fetch_prompts(&LearnerId::from_issued("nobody"))
        .await
        .expect("fetch succeeds");
    assert!(fetched.is_empty());

    let entries = client
        .fetch_learning_entries(&LearnerId::from_issued("nobody"))
        .await
        .expect("fetch succeeds");
    assert!(entries.is_empty());
}

/// An endpoint that does not exist at all reads as "no records yet".
#[tokio::test]
async fn test_missing_endpoint_reads_as_empty() {
    // A server with no routes: every request is a plain 404.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let router = Router::new();
        axum::serve(listener, router).await.ok();
    });

    let client = client_for(addr);
    let fetched = client
        .fetch_prompts(&LearnerId::from_issued("learner-1"))
        .await
        .expect("404 is not an error for reads");
    assert!(fetched.is_empty());
}

/// Replace-all really replaces: the previous collection is gone.
#[tokio::test]
async fn test_replace_discards_previous_collection() {
    let (addr, _store) = spawn_stub().await;
    let client = client_for(addr);
    let learner = LearnerId::from_issued("learner-1");

    client
        .replace_prompts(&learner, &[prompt("old-a", 8), prompt("old-b", 9)])
        .await
        .expect("first replace succeeds");
    client
        .replace_prompts(&learner, &[prompt("new", 10)])
        .await
        .expect("second replace succeeds");

    let fetched = client.fetch_prompts(&learner).await.expect("fetch succeeds");
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].id, "new");
}

/// Replacing with an empty list empties the collection.
#[tokio::test]
async fn test_replace_with_empty_list_clears() {
    let (addr, _store) = spawn_stub().await;
    let client = client_for(addr);
    let learner = LearnerId::from_issued("learner-1");

    client
        .replace_prompts(&learner, &[prompt("p1", 9)])
        .await
        .expect("replace succeeds");
    client
        .replace_prompts(&learner, &[])
        .await
        .expect("empty replace succeeds");

    let fetched = client.fetch_prompts(&learner).await.expect("fetch succeeds");
    assert!(fetched.is_empty());
}

/// Replace-all is scoped: another learner's records are untouched.
#[tokio::test]
async fn test_replace_is_scoped_per_learner() {
    let (addr, _store) = spawn_stub().await;
    let client = client_for(addr);
    let alice = LearnerId::from_issued("alice");
    let bob = LearnerId::from_issued("bob");

    client
        .replace_prompts(&alice, &[prompt("a1", 9)])
        .await
        .expect("alice's replace succeeds");
    client
        .replace_prompts(&bob, &[prompt("b1", 9), prompt("b2", 10)])
        .await
        .expect("bob's replace succeeds");

    client
        .replace_prompts(&alice, &[])
        .await
        .expect("alice clears her library");

    let bobs = client.fetch_prompts(&bob).await.expect("fetch succeeds");
    assert_eq!(bobs.len(), 2, "bob's records must survive alice's replace");
}

/// A failed delete aborts the replace before any insert: no partial state.
#[tokio::test]
async fn test_failed_delete_prevents_partial_replace() {
    let (addr, store) = spawn_stub().await;
    let client = client_for(addr);
    let learner = LearnerId::from_issued("learner-1");

    let original = vec![prompt("keep-a", 9), prompt("keep-b", 10)];
    client
        .replace_prompts(&learner, &original)
        .await
        .expect("initial replace succeeds");

    store.fail_deletes.store(true, Ordering::SeqCst);
    let result = client.replace_prompts(&learner, &[prompt("never", 11)]).await;
    assert!(matches!(result, Err(SyncError::Status { operation: "delete", .. })));

    // The failure surfaced and nothing was inserted: the store still holds
    // exactly the original collection.
    store.fail_deletes.store(false, Ordering::SeqCst);
    let fetched = client.fetch_prompts(&learner).await.expect("fetch succeeds");
    assert_eq!(fetched.len(), 2);
    assert!(fetched.iter().all(|p| p.id.starts_with("keep-")));
}

/// Singleton upsert overwrites in place: one row, latest fields.
#[tokio::test]
async fn test_profile_upsert_overwrites() {
    let (addr, store) = spawn_stub().await;
    let client = client_for(addr);
    let learner = LearnerId::from_issued("learner-1");

    let first = Profile {
        id: "profile-1".to_string(),
        display_name: "Ada".to_string(),
        email: None,
        bio: None,
        updated_at: when(9),
    };
    client
        .upsert_profile(&learner, &first)
        .await
        .expect("first upsert succeeds");

    let second = Profile {
        display_name: "Ada Lovelace".to_string(),
        email: Some("ada@example.com".to_string()),
        ..first
    };
    client
        .upsert_profile(&learner, &second)
        .await
        .expect("second upsert succeeds");

    assert_eq!(store.rows("user_profiles").len(), 1, "upsert must not duplicate");
    let fetched = client
        .fetch_profile(&learner)
        .await
        .expect("fetch succeeds")
        .expect("profile exists");
    assert_eq!(fetched.display_name, "Ada Lovelace");
    assert_eq!(fetched.email.as_deref(), Some("ada@example.com"));
}

/// A missing singleton reads as `None`, not an error.
#[tokio::test]
async fn test_missing_singletons_read_as_none() {
    let (addr, _store) = spawn_stub().await;
    let client = client_for(addr);
    let learner = LearnerId::from_issued("learner-1");

    assert!(client.fetch_profile(&learner).await.expect("fetch succeeds").is_none());
    assert!(client
        .fetch_device_config(&learner)
        .await
        .expect("fetch succeeds")
        .is_none());
}

/// Device config upserts like the profile does.
#[tokio::test]
async fn test_device_config_roundtrip() {
    let (addr, _store) = spawn_stub().await;
    let client = client_for(addr);
    let learner = LearnerId::from_issued("learner-1");

    let config = DeviceConfig {
        id: "device-1".to_string(),
        theme: "dark".to_string(),
        editor_font_size: 14,
        telemetry_opt_in: true,
        updated_at: when(9),
    };
    client
        .upsert_device_config(&learner, &config)
        .await
        .expect("upsert succeeds");

    let fetched = client
        .fetch_device_config(&learner)
        .await
        .expect("fetch succeeds")
        .expect("config exists");
    assert_eq!(fetched, config);
}

/// Collections of every entity kind round-trip through their own tables.
#[tokio::test]
async fn test_entries_and_workflows_roundtrip() {
    let (addr, _store) = spawn_stub().await;
    let client = client_for(addr);
    let learner = LearnerId::from_issued("learner-1");

    let entries = vec![LearningEntry {
        id: "e1".to_string(),
        title: "Week one".to_string(),
        notes: "Roles beat adjectives.".to_string(),
        tags: vec!["notes".to_string()],
        updated_at: when(9),
    }];
    client
        .replace_learning_entries(&learner, &entries)
        .await
        .expect("replace succeeds");
    assert_eq!(
        client
            .fetch_learning_entries(&learner)
            .await
            .expect("fetch succeeds"),
        entries
    );

    let workflows = vec![WorkflowRecord {
        id: "w1".to_string(),
        name: "Triage".to_string(),
        description: "Route tickets".to_string(),
        definition: serde_json::json!({"nodes": [], "edges": []}),
        updated_at: when(10),
    }];
    client
        .replace_workflows(&learner, &workflows)
        .await
        .expect("replace succeeds");
    assert_eq!(
        client.fetch_workflows(&learner).await.expect("fetch succeeds"),
        workflows
    );
}

/// A dead endpoint surfaces as a typed error, not a panic or a hang.
#[tokio::test]
async fn test_unreachable_store_is_an_error() {
    // Bind a port, then drop the listener so connections are refused.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let client = client_for(addr);
    let result = client.fetch_prompts(&LearnerId::from_issued("learner-1")).await;
    assert!(matches!(result, Err(SyncError::Http(_))));
}
