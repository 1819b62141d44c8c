//! Integration tests for the hosted backend client.
//!
//! A stub Axum server stands in for GoTrue and PostgREST so the real HTTP
//! contract (headers, query filters, error bodies) is exercised.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use waypoint::auth::UserRole;
use waypoint::backend::{
    AuthService, RecordStore, Scope, SessionEvent, SignUpAttributes, SupabaseBackend,
};
use waypoint::error::BackendError;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);
const ANON_KEY: &str = "anon-key";

/// One request as the stub saw it.
#[derive(Debug, Clone)]
struct Seen {
    path: &'static str,
    apikey: Option<String>,
    authorization: Option<String>,
    query: HashMap<String, String>,
}

#[derive(Clone, Default)]
struct Stub {
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl Stub {
    fn record(&self, path: &'static str, headers: &HeaderMap, query: HashMap<String, String>) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().unwrap().push(Seen {
            path,
            apikey: header("apikey"),
            authorization: header("authorization"),
            query,
        });
    }

    fn last(&self, path: &str) -> Seen {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|s| s.path == path)
            .cloned()
            .unwrap()
    }

    fn count(&self, path: &str) -> usize {
        self.seen.lock().unwrap().iter().filter(|s| s.path == path).count()
    }
}

async fn token(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let refresh = query.get("grant_type").map(String::as_str) == Some("refresh_token");
    stub.record("token", &headers, query);
    if refresh {
        if body["refresh_token"] != "refresh" {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_grant",
                    "error_description": "Invalid Refresh Token: Refresh Token Not Found",
                })),
            );
        }
        return (
            StatusCode::OK,
            Json(json!({
                "access_token": "fresh-token",
                "refresh_token": "refresh-2",
                "expires_at": 4_102_444_800_i64,
                "user": {"id": "u-1", "email": "sam@example.com"},
            })),
        );
    }
    if body["password"] != "password" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials",
            })),
        );
    }
    // Special addresses shape the issued session.
    let (access_token, refresh_token, expires_at) = match body["email"].as_str() {
        Some("expired@example.com") => ("old-token", "refresh", 1_i64),
        Some("revoked@example.com") => ("old-token", "revoked", 1_i64),
        Some("stale@example.com") => ("stale-token", "refresh", 4_102_444_800_i64),
        _ => ("user-token", "refresh", 4_102_444_800_i64),
    };
    (
        StatusCode::OK,
        Json(json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "expires_at": expires_at,
            "user": {"id": "u-1", "email": body["email"]},
        })),
    )
}

async fn signup(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    stub.record("signup", &headers, HashMap::new());
    assert_eq!(body["data"]["role"], "educator");
    Json(json!({"id": "u-2", "email": body["email"]}))
}

async fn logout(State(stub): State<Stub>, headers: HeaderMap) -> StatusCode {
    stub.record("logout", &headers, HashMap::new());
    StatusCode::NO_CONTENT
}

async fn profiles(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    stub.record("profiles", &headers, query);
    if stub.last("profiles").authorization.as_deref() == Some("Bearer stale-token") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": "PGRST301", "message": "JWT expired"})),
        );
    }
    (StatusCode::OK, Json(json!([{
        "id": "u-1",
        "username": "sam",
        "role": "educator",
        "first_name": "Sam",
        "last_name": null,
        "avatar_url": null,
    }])))
}

async fn questions(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    stub.record("questions", &headers, query);
    Json(json!([
        {
            "id": "q-1",
            "creator_id": "u-1",
            "question_text": "Pick one",
            "category": null,
            "options": [{"text": "A", "isCorrect": true}, {"text": "B", "isCorrect": false}],
            "created_at": "2024-05-01T12:00:00Z",
        },
        {"id": "q-broken"},
    ]))
}

async fn templates_patch(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    stub.record("templates_patch", &headers, query);
    Json(json!([]))
}

async fn start_stub() -> (String, Stub) {
    let stub = Stub::default();
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/signup", post(signup))
        .route("/auth/v1/logout", post(logout))
        .route("/rest/v1/profiles", get(profiles))
        .route("/rest/v1/assessment_questions", get(questions))
        .route(
            "/rest/v1/assessment_templates",
            axum::routing::patch(templates_patch),
        )
        .with_state(stub.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Trailing slash is trimmed by the client.
    (format!("http://127.0.0.1:{port}/"), stub)
}

fn client(base: &str) -> SupabaseBackend {
    SupabaseBackend::new(base, SecretString::from(ANON_KEY.to_string()))
}

#[tokio::test]
async fn test_sign_in_then_profile_uses_session_token() {
    timeout(TEST_TIMEOUT, async {
        let (base, stub) = start_stub().await;
        let backend = client(&base);
        let mut events = backend.subscribe();

        let session = backend.sign_in("sam@example.com", "password").await.unwrap();
        assert_eq!(session.user_id, "u-1");
        assert_eq!(session.access_token.expose_secret(), "user-token");
        assert!(backend.current_session().await.is_some());
        assert!(events.try_recv().is_ok());

        let seen = stub.last("token");
        assert_eq!(seen.apikey.as_deref(), Some(ANON_KEY));
        assert_eq!(seen.query.get("grant_type").map(String::as_str), Some("password"));

        let profile = backend.read_profile("u-1").await.unwrap();
        assert_eq!(profile.role, UserRole::Educator);
        assert_eq!(profile.first_name.as_deref(), Some("Sam"));

        let seen = stub.last("profiles");
        assert_eq!(seen.authorization.as_deref(), Some("Bearer user-token"));
        assert_eq!(seen.query.get("id").map(String::as_str), Some("eq.u-1"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_bad_credentials_surface_remote_message() {
    timeout(TEST_TIMEOUT, async {
        let (base, _stub) = start_stub().await;
        let backend = client(&base);

        let err = backend.sign_in("sam@example.com", "wrong").await.unwrap_err();
        match &err {
            BackendError::Remote { status, message } => {
                assert_eq!(*status, 400);
                assert_eq!(message, "Invalid login credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.user_message(),
            "Invalid email or password. Please try again."
        );
        assert!(backend.current_session().await.is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_pending_sign_up_returns_no_session() {
    timeout(TEST_TIMEOUT, async {
        let (base, stub) = start_stub().await;
        let backend = client(&base);
        let attributes = SignUpAttributes {
            username: "newteach".into(),
            role: UserRole::Educator,
        };
        let session = backend
            .sign_up("new@example.com", "longenough", &attributes)
            .await
            .unwrap();
        assert!(session.is_none());
        assert!(backend.current_session().await.is_none());
        assert_eq!(stub.last("signup").apikey.as_deref(), Some(ANON_KEY));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_owner_listing_filters_and_skips_malformed_rows() {
    timeout(TEST_TIMEOUT, async {
        let (base, stub) = start_stub().await;
        let backend = client(&base);

        let questions = backend.list_questions(Scope::Owner("u-1")).await.unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, "q-1");
        assert_eq!(questions[0].category, "");
        assert_eq!(questions[0].correct_option().unwrap().text, "A");

        let seen = stub.last("questions");
        // Signed out: the anon key doubles as the bearer token.
        assert_eq!(seen.authorization.as_deref(), Some("Bearer anon-key"));
        assert_eq!(seen.query.get("creator_id").map(String::as_str), Some("eq.u-1"));
        assert_eq!(
            seen.query.get("order").map(String::as_str),
            Some("created_at.desc")
        );

        backend.list_questions(Scope::All).await.unwrap();
        assert!(!stub.last("questions").query.contains_key("creator_id"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_publish_missing_template_is_not_found() {
    timeout(TEST_TIMEOUT, async {
        let (base, stub) = start_stub().await;
        let backend = client(&base);
        let err = backend
            .set_template_published("t-404", true)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
        assert_eq!(
            stub.last("templates_patch").query.get("id").map(String::as_str),
            Some("eq.t-404")
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_sign_out_revokes_and_clears_session() {
    timeout(TEST_TIMEOUT, async {
        let (base, stub) = start_stub().await;
        let backend = client(&base);
        backend.sign_in("sam@example.com", "password").await.unwrap();
        backend.sign_out().await.unwrap();

        assert!(backend.current_session().await.is_none());
        assert_eq!(
            stub.last("logout").authorization.as_deref(),
            Some("Bearer user-token")
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_expired_session_is_refreshed_before_use() {
    timeout(TEST_TIMEOUT, async {
        let (base, stub) = start_stub().await;
        let backend = client(&base);
        let mut events = backend.subscribe();

        backend.sign_in("expired@example.com", "password").await.unwrap();
        let session = backend.current_session().await.unwrap();
        assert_eq!(session.access_token.expose_secret(), "fresh-token");

        let seen = stub.last("token");
        assert_eq!(
            seen.query.get("grant_type").map(String::as_str),
            Some("refresh_token")
        );
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedIn(_)));
        match events.recv().await.unwrap() {
            SessionEvent::SignedIn(s) => assert_eq!(s.access_token.expose_secret(), "fresh-token"),
            other => panic!("unexpected event: {other:?}"),
        }

        backend.read_profile("u-1").await.unwrap();
        assert_eq!(
            stub.last("profiles").authorization.as_deref(),
            Some("Bearer fresh-token")
        );
        // The refreshed token is not refreshed again.
        assert_eq!(stub.count("token"), 2);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_failed_refresh_of_expired_session_signs_out() {
    timeout(TEST_TIMEOUT, async {
        let (base, stub) = start_stub().await;
        let backend = client(&base);
        let mut events = backend.subscribe();

        backend.sign_in("revoked@example.com", "password").await.unwrap();
        assert!(backend.current_session().await.is_none());
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedIn(_)));
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::SignedOut));

        // Record calls fall back to the anon key.
        backend.list_questions(Scope::All).await.unwrap();
        assert_eq!(
            stub.last("questions").authorization.as_deref(),
            Some("Bearer anon-key")
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn test_rejected_token_is_refreshed_and_retried() {
    timeout(TEST_TIMEOUT, async {
        let (base, stub) = start_stub().await;
        let backend = client(&base);

        backend.sign_in("stale@example.com", "password").await.unwrap();
        let profile = backend.read_profile("u-1").await.unwrap();
        assert_eq!(profile.first_name.as_deref(), Some("Sam"));

        assert_eq!(stub.count("profiles"), 2);
        assert_eq!(
            stub.last("profiles").authorization.as_deref(),
            Some("Bearer fresh-token")
        );
        let session = backend.current_session().await.unwrap();
        assert_eq!(session.access_token.expose_secret(), "fresh-token");
    })
    .await
    .expect("test timed out");
}
