//! `HttpBackend` against a live HTTP server.

use super::harness::MockHttpServer;
use crate::{Backend, HttpBackend, OnboardingRequest, PreferencesUpdate, StateError, Theme};

const PREFS_JSON: &str = r#"{"user_id":"default_user","name":"Ada","theme":"dark","model":"gpt-4o","temperature":0.7,"max_tokens":1500,"onboarded":true,"created_at":"2024-05-01T12:00:00","updated_at":"2024-05-01T12:00:00"}"#;

fn backend_for(server: &MockHttpServer) -> HttpBackend {
    HttpBackend::from_url_str(server.base_url()).unwrap()
}

#[tokio::test]
async fn get_preferences_parses_response() {
    let server = MockHttpServer::start().await;
    server.route("GET", "/api/preferences", 200, PREFS_JSON);

    let prefs = backend_for(&server).get_preferences().await.unwrap();

    assert_eq!(prefs.name.as_deref(), Some("Ada"));
    assert_eq!(prefs.theme, Theme::Dark);
    assert!(prefs.onboarded);
}

#[tokio::test]
async fn update_preferences_posts_partial_body() {
    let server = MockHttpServer::start().await;
    server.route("POST", "/api/preferences", 200, PREFS_JSON);

    backend_for(&server)
        .update_preferences(&PreferencesUpdate::theme(Theme::Dark))
        .await
        .unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].body, r#"{"theme":"dark"}"#);
}

#[tokio::test]
async fn onboarding_posts_name_and_theme() {
    let server = MockHttpServer::start().await;
    server.route("POST", "/api/onboarding", 200, PREFS_JSON);

    let request = OnboardingRequest {
        name: "Ada".to_string(),
        theme: Theme::Dark,
    };
    backend_for(&server).complete_onboarding(&request).await.unwrap();

    let body: serde_json::Value = serde_json::from_str(&server.requests()[0].body).unwrap();
    assert_eq!(body, serde_json::json!({"name": "Ada", "theme": "dark"}));
}

#[tokio::test]
async fn session_endpoints() {
    let server = MockHttpServer::start().await;
    server.route(
        "GET",
        "/api/sessions",
        200,
        r#"[{"id":2,"user_id":"default_user","title":"Morning run","created_at":"2024-05-01T12:00:00","updated_at":"2024-05-01T12:05:00","message_count":4}]"#,
    );
    server.route("POST", "/api/sessions", 200, r#"{"id":3}"#);
    server.route("DELETE", "/api/sessions/2", 200, r#"{"status":"deleted"}"#);
    let backend = backend_for(&server);

    let sessions = backend.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].title, "Morning run");
    assert_eq!(sessions[0].message_count, 4);

    assert_eq!(backend.create_session().await.unwrap(), 3);
    backend.delete_session(2).await.unwrap();

    let paths: Vec<_> = server
        .requests()
        .into_iter()
        .map(|r| format!("{} {}", r.method, r.path))
        .collect();
    assert_eq!(
        paths,
        vec!["GET /api/sessions", "POST /api/sessions", "DELETE /api/sessions/2"]
    );
}

#[tokio::test]
async fn create_session_without_id_is_an_error() {
    let server = MockHttpServer::start().await;
    server.route("POST", "/api/sessions", 200, "{}");

    let result = backend_for(&server).create_session().await;

    assert!(matches!(result, Err(StateError::UnexpectedResponse(_))));
}

#[tokio::test]
async fn non_success_status_becomes_api_error() {
    let server = MockHttpServer::start().await;
    server.route(
        "GET",
        "/api/preferences",
        500,
        r#"{"detail":"database is locked"}"#,
    );

    let err = backend_for(&server).get_preferences().await.unwrap_err();

    match err {
        StateError::Api { status, message } => {
            assert_eq!(status, 500);
            assert!(message.contains("len="));
            assert!(!message.contains("database is locked"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_json_error() {
    let server = MockHttpServer::start().await;
    server.route("GET", "/api/sessions", 200, "not json");

    let result = backend_for(&server).list_sessions().await;

    assert!(matches!(result, Err(StateError::Json(_))));
}

#[tokio::test]
async fn unreachable_server_is_an_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::from_url_str(&format!("http://{addr}")).unwrap();
    let result = backend.get_preferences().await;

    assert!(matches!(result, Err(StateError::Http(_))));
}
