//! Exercises the real HTTP client against an in-process stub of the platform.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storili_platform::{
    AgentPlatform, CredentialKind, ElevenLabsClient, PlatformConfig, PlatformError, TokenIssuer,
};
use storili_types::{
    AgentConfig, AgentSettings, ConversationConfig, LlmModel, PromptSettings, Workflow,
};
use tokio::net::TcpListener;

const API_KEY: &str = "test-key";

#[derive(Default)]
struct Stub {
    create_hits: AtomicUsize,
    token_hits: AtomicUsize,
    /// Number of token requests to fail with 503 before succeeding.
    token_failures: AtomicUsize,
    fail_create: bool,
    last_body: Mutex<Option<Value>>,
    agents: Mutex<HashMap<String, Value>>,
}

fn authorized(headers: &HeaderMap) -> bool {
    headers.get("xi-api-key").and_then(|v| v.to_str().ok()) == Some(API_KEY)
}

async fn create(
    State(stub): State<Arc<Stub>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.create_hits.fetch_add(1, Ordering::SeqCst);
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "bad key" })));
    }
    if stub.fail_create {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "boom" })),
        );
    }
    let mut doc = body.clone();
    doc["agent_id"] = json!("agent-new");
    stub.agents.lock().unwrap().insert("agent-new".to_string(), doc);
    *stub.last_body.lock().unwrap() = Some(body);
    (StatusCode::OK, Json(json!({ "agent_id": "agent-new" })))
}

async fn get_agent(
    State(stub): State<Arc<Stub>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match stub.agents.lock().unwrap().get(&id) {
        Some(doc) => (StatusCode::OK, Json(doc.clone())),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "not found" }))),
    }
}

async fn patch_agent(
    State(stub): State<Arc<Stub>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    let mut agents = stub.agents.lock().unwrap();
    match agents.get_mut(&id) {
        Some(doc) => {
            doc["name"] = body["name"].clone();
            StatusCode::OK
        }
        None => StatusCode::NOT_FOUND,
    }
}

async fn delete_agent(State(stub): State<Arc<Stub>>, Path(id): Path<String>) -> StatusCode {
    match stub.agents.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::OK,
        None => StatusCode::NOT_FOUND,
    }
}

async fn list(State(stub): State<Arc<Stub>>) -> Json<Value> {
    let agents: Vec<Value> = stub
        .agents
        .lock()
        .unwrap()
        .iter()
        .map(|(id, doc)| json!({ "agent_id": id, "name": doc["name"] }))
        .collect();
    Json(json!({ "agents": agents, "has_more": false }))
}

async fn token(
    State(stub): State<Arc<Stub>>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    stub.token_hits.fetch_add(1, Ordering::SeqCst);
    let remaining = stub.token_failures.load(Ordering::SeqCst);
    if remaining > 0 {
        stub.token_failures.store(remaining - 1, Ordering::SeqCst);
        return (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})));
    }
    let agent = params.get("agent_id").cloned().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({ "token": format!("tok-{agent}"), "expires_in": 600 })),
    )
}

async fn signed_url(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let agent = params.get("agent_id").cloned().unwrap_or_default();
    Json(json!({ "signed_url": format!("wss://example.test/{agent}") }))
}

async fn spawn_stub(stub: Arc<Stub>) -> String {
    let app = Router::new()
        .route("/v1/convai/agents/create", post(create))
        .route("/v1/convai/agents", get(list))
        .route(
            "/v1/convai/agents/{id}",
            get(get_agent).patch(patch_agent).delete(delete_agent),
        )
        .route("/v1/convai/conversation/token", get(token))
        .route("/v1/convai/conversation/get-signed-url", get(signed_url))
        .with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v1")
}

fn client(base_url: &str, api_key: &str) -> ElevenLabsClient {
    let config = PlatformConfig {
        retry_backoff_ms: 1,
        ..PlatformConfig::new(base_url, api_key)
    };
    ElevenLabsClient::new(config).unwrap()
}

fn sample_config(name: &str) -> AgentConfig {
    AgentConfig {
        name: name.to_string(),
        conversation_config: ConversationConfig {
            agent: AgentSettings {
                first_message: "Hello!".to_string(),
                language: "en".to_string(),
                prompt: PromptSettings {
                    prompt: "You narrate.".to_string(),
                    llm: LlmModel::Gpt4oMini,
                    temperature: Some(0.7),
                    max_tokens: None,
                    ignore_default_personality: None,
                    tools: Vec::new(),
                },
            },
            tts: None,
            turn: None,
        },
        workflow: Workflow::start_only(),
    }
}

#[tokio::test]
async fn agent_lifecycle_round_trips_through_the_api() {
    let stub = Arc::new(Stub::default());
    let base = spawn_stub(stub.clone()).await;
    let client = client(&base, API_KEY);

    let agent_id = client.create_agent(&sample_config("Story A")).await.unwrap();
    assert_eq!(agent_id, "agent-new");
    let sent = stub.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(sent["conversation_config"]["agent"]["prompt"]["llm"], "gpt-4o-mini");

    client
        .update_agent(&agent_id, &sample_config("Story A v2"))
        .await
        .unwrap();
    let fetched = client.get_agent(&agent_id).await.unwrap();
    assert_eq!(fetched.agent_id, "agent-new");
    assert_eq!(fetched.name.as_deref(), Some("Story A v2"));

    let listed = client.list_agents().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].agent_id, "agent-new");

    client.delete_agent(&agent_id).await.unwrap();
    let err = client.get_agent(&agent_id).await.unwrap_err();
    assert!(err.is_not_found(), "expected 404, got {err}");
}

#[tokio::test]
async fn create_is_never_retried() {
    let stub = Arc::new(Stub {
        fail_create: true,
        ..Stub::default()
    });
    let base = spawn_stub(stub.clone()).await;

    let err = client(&base, API_KEY)
        .create_agent(&sample_config("Story A"))
        .await
        .unwrap_err();
    match err {
        PlatformError::Remote { status, body, .. } => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    assert_eq!(stub.create_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn token_issuance_retries_transient_failures() {
    let stub = Arc::new(Stub::default());
    stub.token_failures.store(2, Ordering::SeqCst);
    let base = spawn_stub(stub.clone()).await;

    let token = client(&base, API_KEY)
        .issue_credential("agent-1", CredentialKind::Token)
        .await
        .unwrap();
    assert_eq!(token, "tok-agent-1");
    assert_eq!(stub.token_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn token_issuance_gives_up_after_max_retries() {
    let stub = Arc::new(Stub::default());
    stub.token_failures.store(10, Ordering::SeqCst);
    let base = spawn_stub(stub.clone()).await;

    let err = client(&base, API_KEY)
        .issue_credential("agent-1", CredentialKind::Token)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(stub.token_hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn signed_url_mode_returns_only_the_url() {
    let stub = Arc::new(Stub::default());
    let base = spawn_stub(stub).await;

    let url = client(&base, API_KEY)
        .issue_credential("agent-7", CredentialKind::SignedUrl)
        .await
        .unwrap();
    assert_eq!(url, "wss://example.test/agent-7");
}

#[tokio::test]
async fn wrong_api_key_surfaces_remote_status() {
    let stub = Arc::new(Stub::default());
    let base = spawn_stub(stub).await;

    let err = client(&base, "wrong-key")
        .create_agent(&sample_config("Story A"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn unreachable_platform_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}/v1"), API_KEY)
        .delete_agent("agent-1")
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Transport { .. }));
}

#[test]
fn empty_api_key_is_rejected() {
    let err = ElevenLabsClient::new(PlatformConfig::new("http://localhost/v1", " ")).unwrap_err();
    assert!(matches!(err, PlatformError::Config(_)));
}
