//! Test utilities for integration tests
use std::sync::{Arc, RwLock};

use axum::{Router, body::Body};
use tempfile::TempDir;
use tokio_rusqlite::Connection;

use mailbill::api::AppState;
use mailbill::api::app;
use mailbill::core::AppConfig;
use mailbill::core::db::async_db;
use mailbill::core::db::initialize_db;
use mailbill::google::oauth::save_refresh_token;

pub const TEST_USER: &str = "me@firm.com";

/// Handle to a running test app. The temporary directory holding the
/// db is removed when this is dropped.
pub struct TestApp {
    pub router: Router,
    pub db: Connection,
    _dir: TempDir,
}

/// Creates a test application router backed by a fresh db. Every
/// upstream service (Gmail, Google OAuth, the completion model and
/// Clio) is pointed at `mock_url`.
///
/// A Gmail refresh token is stored for `TEST_USER`.
pub async fn test_app(mock_url: &str) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("db");
    let db_path_str = db_path.to_str().unwrap();

    let db = async_db(db_path_str)
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();
    save_refresh_token(&db, TEST_USER, "test-refresh-token")
        .await
        .unwrap();

    let app_config = AppConfig {
        storage_path: dir.path().display().to_string(),
        db_path: db_path_str.to_string(),
        default_user: String::from(TEST_USER),
        max_emails: 5,
        gmail_api_base_url: mock_url.to_string(),
        google_oauth_token_url: format!("{}/token", mock_url),
        gmail_api_client_id: String::from("test_client_id"),
        gmail_api_client_secret: String::from("test_client_secret"),
        gmail_redirect_uri: String::from("http://127.0.0.1:8080"),
        openai_api_hostname: mock_url.to_string(),
        openai_api_key: Some(String::from("test-api-key")),
        openai_model: String::from("test-model"),
        default_matter_id: 12060094,
        clio_base_url: mock_url.to_string(),
        clio_client_id: String::from("test_clio_id"),
        clio_client_secret: String::from("test_clio_secret"),
        clio_redirect_uri: String::from("http://127.0.0.1:8000/clio/callback"),
    };
    let app_state = AppState::new(db.clone(), app_config).expect("Failed to build app state");

    TestApp {
        router: app(Arc::new(RwLock::new(app_state))),
        db,
        _dir: dir,
    }
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Mock the Google token refresh and a sent folder containing one
/// plain text email per body.
pub async fn mock_gmail(server: &mut mockito::Server, bodies: &[&str]) -> Vec<mockito::Mock> {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE;

    let mut mocks = vec![
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token": "ya29.test", "expires_in": 3599}"#)
            .create_async()
            .await,
    ];

    let ids: Vec<String> = (0..bodies.len()).map(|i| format!("m{}", i)).collect();
    let listing = serde_json::json!({
        "messages": ids.iter().map(|id| serde_json::json!({"id": id, "threadId": id})).collect::<Vec<_>>(),
        "resultSizeEstimate": bodies.len(),
    });
    mocks.push(
        server
            .mock("GET", "/gmail/v1/users/me/messages")
            .match_query(mockito::Matcher::UrlEncoded(
                "labelIds".into(),
                "SENT".into(),
            ))
            .match_header("authorization", "Bearer ya29.test")
            .with_status(200)
            .with_body(listing.to_string())
            .create_async()
            .await,
    );

    for (id, body) in ids.iter().zip(bodies) {
        let message = serde_json::json!({
            "id": id,
            "threadId": id,
            "snippet": "",
            "payload": {
                "mimeType": "text/plain",
                "headers": [
                    {"name": "Subject", "value": format!("Subject {}", id)},
                    {"name": "To", "value": "client@example.com"},
                    {"name": "From", "value": TEST_USER},
                ],
                "body": {"size": body.len(), "data": URL_SAFE.encode(body)},
            }
        });
        mocks.push(
            server
                .mock("GET", format!("/gmail/v1/users/me/messages/{}?format=full", id).as_str())
                .with_status(200)
                .with_body(message.to_string())
                .create_async()
                .await,
        );
    }

    mocks
}

/// Mock a completion endpoint that always replies with `content`.
pub async fn mock_completion(server: &mut mockito::Server, content: &str) -> mockito::Mock {
    server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-api-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
            })
            .to_string(),
        )
        .create_async()
        .await
}
