//! Integration tests for the portal auth API

use portal_client::{
    ApiError, AuthApi, Credentials, Environment, KeyValueStorage, MemoryStorage, Navigator,
    PortalClient, RegistrationRequest, UserRole,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{any, body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    // Several tests share one process; only the first install wins
    let _ = tracing_subscriber::fmt()
        .with_env_filter("portal_client=debug")
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect(&self, path: &str) {
        self.visited.lock().unwrap().push(path.to_string());
    }
}

struct Harness {
    api: AuthApi,
    storage: Arc<MemoryStorage>,
    navigator: Arc<RecordingNavigator>,
}

fn harness(base_url: &str) -> Harness {
    init_tracing();
    let storage = Arc::new(MemoryStorage::new());
    let navigator = Arc::new(RecordingNavigator::default());
    let environment = Environment::headless()
        .with_storage(storage.clone())
        .with_navigator(navigator.clone());

    let client = PortalClient::builder()
        .api_base_url(base_url)
        .environment(environment)
        .build()
        .unwrap();

    Harness {
        api: AuthApi::new(client),
        storage,
        navigator,
    }
}

fn stored_token(storage: &MemoryStorage) -> Option<String> {
    storage.get("access_token").unwrap()
}

fn user_json() -> serde_json::Value {
    json!({
        "id": "0b6f7c2e-2f9a-4b8e-9a57-7f3d2f6c1e10",
        "email": "a@b.com",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "role": "designer",
        "is_active": true,
        "is_superuser": false
    })
}

#[tokio::test]
async fn test_login_sends_form_and_persists_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("username=a%40b.com&password=x"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok-123", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server.uri());
    assert_eq!(stored_token(&h.storage), None);
    assert!(!h.api.is_authenticated());

    let response = h
        .api
        .login(&Credentials::new("a@b.com", "x"))
        .await
        .unwrap();

    assert_eq!(response.access_token, "tok-123");
    assert_eq!(response.token_type, "bearer");
    assert_eq!(stored_token(&h.storage).as_deref(), Some("tok-123"));
    assert!(h.api.is_authenticated());
}

#[tokio::test]
async fn test_login_overwrites_previous_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "new"})))
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server.uri());
    h.storage.set("access_token", "old").unwrap();

    h.api
        .login(&Credentials::new("a@b.com", "x"))
        .await
        .unwrap();
    assert_eq!(stored_token(&h.storage).as_deref(), Some("new"));
}

#[tokio::test]
async fn test_login_failure_propagates_and_stores_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Incorrect email or password"})),
        )
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server.uri());
    let err = h
        .api
        .login(&Credentials::new("nobody@example.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 401);
    assert_eq!(err.message(), "Incorrect email or password");
    assert_eq!(stored_token(&h.storage), None);
}

#[tokio::test]
async fn test_logout_clears_token_without_network() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server.uri());

    // No token yet
    h.api.logout();
    assert_eq!(stored_token(&h.storage), None);

    h.storage.set("access_token", "tok").unwrap();
    h.api.logout();
    assert_eq!(stored_token(&h.storage), None);
    assert!(!h.api.is_authenticated());
    assert!(h.navigator.visited().is_empty());
}

#[tokio::test]
async fn test_bearer_header_follows_stored_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server.uri());

    // Anonymous request first
    h.api.current_user().await.unwrap();

    h.storage.set("access_token", "tok-456").unwrap();
    let user = h.api.current_user().await.unwrap();
    assert_eq!(user.email, "a@b.com");
    assert_eq!(user.role, UserRole::Designer);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(!requests[0].headers.contains_key("authorization"));
    assert_eq!(
        requests[1].headers.get("authorization").unwrap(),
        "Bearer tok-456"
    );
}

#[tokio::test]
async fn test_current_user_unauthorized_logs_out_and_redirects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Could not validate credentials"})),
        )
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server.uri());
    h.storage.set("access_token", "expired").unwrap();

    let err = h.api.current_user().await.unwrap_err();

    assert_eq!(err.status_code(), 401);
    assert!(err.is_unauthorized());
    assert_eq!(stored_token(&h.storage), None);
    assert_eq!(h.navigator.visited(), vec!["/auth/login".to_string()]);
}

#[tokio::test]
async fn test_not_found_detail_is_normalized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found"})))
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server.uri());
    let err = h.api.current_user().await.unwrap_err();

    assert_eq!(err.message(), "Not found");
    assert_eq!(err.status_code(), 404);
    assert!(h.navigator.visited().is_empty());
}

#[tokio::test]
async fn test_server_error_without_detail_uses_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server.uri());
    let err = h.api.current_user().await.unwrap_err();

    assert_eq!(err.message(), "An error occurred");
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Grab a free port, then close it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let h = harness(&format!("http://{addr}"));
    h.storage.set("access_token", "tok").unwrap();

    let err = h.api.current_user().await.unwrap_err();

    assert_eq!(err, ApiError::network());
    assert_eq!(err.message(), "network error");
    assert_eq!(err.status_code(), 0);
    // No response, so the session is left alone
    assert_eq!(stored_token(&h.storage).as_deref(), Some("tok"));
    assert!(h.navigator.visited().is_empty());
}

#[tokio::test]
async fn test_register_sends_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "email": "a@b.com",
            "password": "secret",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "role": "designer"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(user_json()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server.uri());
    let request = RegistrationRequest::new("a@b.com", "secret")
        .first_name("Ada")
        .last_name("Lovelace")
        .role(UserRole::Designer);

    let user = h.api.register(&request).await.unwrap();
    assert_eq!(user.full_name().as_deref(), Some("Ada Lovelace"));
    // Registration does not log the user in
    assert_eq!(stored_token(&h.storage), None);
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Email already registered"})),
        )
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server.uri());
    let err = h
        .api
        .register(&RegistrationRequest::new("a@b.com", "secret"))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.message(), "Email already registered");
}

#[tokio::test]
async fn test_register_validation_error_comes_from_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{
                "loc": ["body", "password"],
                "msg": "String should have at most 72 characters",
                "type": "string_too_long"
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let h = harness(&mock_server.uri());
    let err = h
        .api
        .register(&RegistrationRequest::new("a@b.com", "p".repeat(73)))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 422);
    assert_eq!(err.message(), "String should have at most 72 characters");
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_headless_environment_skips_storage() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Not authenticated"})))
        .mount(&mock_server)
        .await;

    let client = PortalClient::builder()
        .api_base_url(mock_server.uri())
        .build()
        .unwrap();
    let api = AuthApi::new(client);

    let response = api.login(&Credentials::new("a@b.com", "x")).await.unwrap();
    assert_eq!(response.access_token, "tok");
    assert!(!api.is_authenticated());

    let err = api.current_user().await.unwrap_err();
    assert_eq!(err.status_code(), 401);
    assert_eq!(err.message(), "Not authenticated");

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| !r.headers.contains_key("authorization")));
}
