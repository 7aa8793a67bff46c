//! Integration tests for session restore against a mocked identity service

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokenkeep_core::session::SESSION_KEY;
use tokenkeep_core::{
    ApiClient, ApiError, FileStorage, MemoryStorage, Session, SessionError, SessionStore, Storage,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer, storage: Arc<dyn Storage>) -> SessionStore {
    let api = ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap();
    SessionStore::new(storage, api)
}

fn stored_record(storage: &dyn Storage) -> Option<serde_json::Value> {
    storage
        .get(SESSION_KEY)
        .unwrap()
        .map(|json| serde_json::from_str(&json).unwrap())
}

async fn mount_me(server: &MockServer, token: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/api/v1/me"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn expired() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({ "error": "expired token" }))
}

#[tokio::test]
async fn test_no_session_stored() {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let store = store_for(&server, storage.clone());

    let err = store.restore_session().await.unwrap_err();
    assert!(matches!(err, SessionError::NoSession));
    assert!(storage.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_valid_access_token() {
    let server = MockServer::start().await;
    mount_me(
        &server,
        "a1",
        ResponseTemplate::new(200).set_body_json(json!({ "user": { "id": 1, "name": "Ada" } })),
    )
    .await;

    let storage = Arc::new(MemoryStorage::new());
    let store = store_for(&server, storage.clone());
    store.persist_session("a1", "r1").unwrap();

    let session = store.restore_session().await.unwrap();
    assert_eq!(session.access_token, "a1");
    assert_eq!(session.refresh_token, "r1");
    assert_eq!(session.user, Some(json!({ "id": 1, "name": "Ada" })));
    assert_eq!(
        stored_record(&*storage),
        Some(json!({ "accessToken": "a1", "refreshToken": "r1" }))
    );
}

#[tokio::test]
async fn test_expired_token_refreshed_once() {
    let server = MockServer::start().await;
    mount_me(&server, "a1", expired()).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "r1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "a2" })))
        .expect(1)
        .mount(&server)
        .await;
    mount_me(
        &server,
        "a2",
        ResponseTemplate::new(200).set_body_json(json!({ "user": { "id": 1 } })),
    )
    .await;

    let storage = Arc::new(MemoryStorage::new());
    let store = store_for(&server, storage.clone());
    store.persist_session("a1", "r1").unwrap();

    let session = store.restore_session().await.unwrap();
    assert_eq!(
        session,
        Session::new("a2", "r1").with_user(json!({ "id": 1 }))
    );
    assert_eq!(
        stored_record(&*storage),
        Some(json!({ "accessToken": "a2", "refreshToken": "r1" }))
    );
}

#[tokio::test]
async fn test_refresh_rejected_clears_session() {
    let server = MockServer::start().await;
    mount_me(&server, "a1", expired()).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid refresh token" })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let store = store_for(&server, storage.clone());
    store.persist_session("a1", "r1").unwrap();

    let err = store.restore_session().await.unwrap_err();
    assert!(matches!(err, SessionError::RefreshFailed(_)));
    assert_eq!(stored_record(&*storage), None);
}

#[tokio::test]
async fn test_refresh_rejected_with_non_json_body_clears_session() {
    let server = MockServer::start().await;
    mount_me(&server, "a1", expired()).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let store = store_for(&server, storage.clone());
    store.persist_session("a1", "r1").unwrap();

    let err = store.restore_session().await.unwrap_err();
    assert!(matches!(err, SessionError::RefreshFailed(_)));
    assert!(!storage.contains(SESSION_KEY));
}

#[tokio::test]
async fn test_other_auth_error_does_not_refresh() {
    let server = MockServer::start().await;
    mount_me(
        &server,
        "a1",
        ResponseTemplate::new(401).set_body_json(json!({ "error": "invalid token" })),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "a2" })))
        .expect(0)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let store = store_for(&server, storage.clone());
    store.persist_session("a1", "r1").unwrap();

    match store.restore_session().await.unwrap_err() {
        SessionError::AuthRejected(message) => assert_eq!(message, "invalid token"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        stored_record(&*storage),
        Some(json!({ "accessToken": "a1", "refreshToken": "r1" }))
    );
}

#[tokio::test]
async fn test_retry_after_refresh_rejected() {
    let server = MockServer::start().await;
    mount_me(&server, "a1", expired()).await;
    mount_me(&server, "a2", expired()).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "a2" })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryStorage::new());
    let store = store_for(&server, storage.clone());
    store.persist_session("a1", "r1").unwrap();

    let err = store.restore_session().await.unwrap_err();
    assert!(matches!(err, SessionError::RetryAfterRefreshFailed(_)));
    assert_eq!(
        stored_record(&*storage),
        Some(json!({ "accessToken": "a2", "refreshToken": "r1" }))
    );
}

#[tokio::test]
async fn test_unexpected_identity_payload() {
    let server = MockServer::start().await;
    mount_me(
        &server,
        "a1",
        ResponseTemplate::new(200).set_body_string("<html>login</html>"),
    )
    .await;

    let storage = Arc::new(MemoryStorage::new());
    let store = store_for(&server, storage.clone());
    store.persist_session("a1", "r1").unwrap();

    let err = store.restore_session().await.unwrap_err();
    assert!(matches!(err, SessionError::Api(ApiError::InvalidResponse(_))));
    assert!(storage.contains(SESSION_KEY));
}

#[tokio::test]
async fn test_identity_payload_without_user() {
    let server = MockServer::start().await;
    mount_me(
        &server,
        "a1",
        ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "name": "Ada" })),
    )
    .await;

    let storage = Arc::new(MemoryStorage::new());
    let store = store_for(&server, storage.clone());
    store.persist_session("a1", "r1").unwrap();

    let err = store.restore_session().await.unwrap_err();
    assert!(matches!(err, SessionError::Api(ApiError::InvalidResponse(_))));
    assert!(err.is_transient());
    assert!(storage.contains(SESSION_KEY));
}

#[tokio::test]
async fn test_clear_then_restore_fails() {
    let server = MockServer::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let store = store_for(&server, storage.clone());

    store.persist_session("a1", "r1").unwrap();
    store.clear_session().unwrap();
    store.clear_session().unwrap();

    let err = store.restore_session().await.unwrap_err();
    assert!(matches!(err, SessionError::NoSession));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_refreshed_token_survives_reopen() {
    let server = MockServer::start().await;
    mount_me(&server, "a1", expired()).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "a2" })))
        .mount(&server)
        .await;
    mount_me(
        &server,
        "a2",
        ResponseTemplate::new(200).set_body_json(json!({ "user": {} })),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let store = store_for(&server, Arc::new(FileStorage::new(dir.path().to_path_buf())));
    store.persist_session("a1", "r1").unwrap();
    store.restore_session().await.unwrap();

    let reopened = store_for(&server, Arc::new(FileStorage::new(dir.path().to_path_buf())));
    assert_eq!(reopened.load_session().unwrap(), Session::new("a2", "r1"));
}
