//! Integration tests for the Quill API client and its request pipeline

use futures::StreamExt;
use quill_http::client::auth::{BearerAuth, Navigator, UnauthorizedHandler};
use quill_http::client::error::ClientError;
use quill_http::session::{ADMIN_ROLE, KeyValueStorage, MemoryStorage, StorageError, UserId};
use quill_http::types::{ImageFile, JobStatus, ListQuery, PostPayload};
use quill_http::{ApiClient, Audience, CredentialStore, RequestTimeout, UserProfile};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Navigator that records forced navigations
struct RecordingNavigator {
    current: Mutex<String>,
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    fn at(path: &str) -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new(path.to_string()),
            visits: Mutex::new(Vec::new()),
        })
    }

    fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current_path(&self) -> String {
        self.current.lock().unwrap().clone()
    }

    fn navigate_to(&self, path: &str) {
        *self.current.lock().unwrap() = path.to_string();
        self.visits.lock().unwrap().push(path.to_string());
    }
}

struct Harness {
    server: MockServer,
    client: ApiClient,
    credentials: Arc<CredentialStore>,
    navigator: Arc<RecordingNavigator>,
}

async fn harness(current_path: &str) -> Harness {
    let server = MockServer::start().await;
    let credentials = Arc::new(CredentialStore::new(Arc::new(MemoryStorage::new())));
    let navigator = RecordingNavigator::at(current_path);

    let client = ApiClient::builder()
        .base_url(format!("{}/api/", server.uri()))
        .timeout(Duration::from_secs(7))
        .with(BearerAuth::new(credentials.clone()))
        .with(UnauthorizedHandler::new(credentials.clone(), navigator.clone()))
        .build()
        .unwrap();

    Harness {
        server,
        client,
        credentials,
        navigator,
    }
}

fn sign_in(credentials: &CredentialStore, audience: Audience, token: &str, role: &str) {
    credentials
        .set_session(audience, token, &UserProfile::new(UserId::Numeric(1), role))
        .unwrap();
}

async fn authorization_headers(server: &MockServer) -> Vec<Option<String>> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|req| {
            req.headers
                .get("authorization")
                .map(|value| value.to_str().unwrap().to_string())
        })
        .collect()
}

#[tokio::test]
async fn test_client_builder_requires_base_url() {
    let result = ApiClient::builder().build();
    assert!(matches!(result, Err(ClientError::Configuration(_))));
}

#[tokio::test]
async fn test_client_builder_trims_trailing_slash() {
    let client = ApiClient::builder()
        .base_url("http://localhost:8080/api/")
        .build()
        .unwrap();
    assert_eq!(client.base_url(), "http://localhost:8080/api");
    assert!(client.middleware().is_empty());
}

#[tokio::test]
async fn test_client_builder_falls_back_to_default_timeouts() {
    let client = ApiClient::builder()
        .base_url("http://localhost:8080/api")
        .build()
        .unwrap();
    assert_eq!(client.default_timeout(), Duration::from_millis(7000));
    assert_eq!(client.upload_timeout(), Duration::from_millis(30000));
}

/// Storage that fails every operation, like a browser with storage disabled
struct UnreadableStorage;

impl KeyValueStorage for UnreadableStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable("localStorage disabled".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("localStorage disabled".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("localStorage disabled".to_string()))
    }
}

#[tokio::test]
async fn test_unreadable_storage_sends_requests_without_credentials() {
    let server = MockServer::start().await;
    let credentials = Arc::new(CredentialStore::new(Arc::new(UnreadableStorage)));
    let client = ApiClient::builder()
        .base_url(format!("{}/api", server.uri()))
        .with(BearerAuth::new(credentials))
        .build()
        .unwrap();

    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    client.posts().list(&ListQuery::default()).await.unwrap();
    client.admin_posts().list(&ListQuery::default()).await.unwrap();

    assert_eq!(authorization_headers(&server).await, vec![None, None]);
}

#[tokio::test]
async fn test_admin_path_carries_admin_token() {
    let h = harness("/admin/posts").await;
    sign_in(&h.credentials, Audience::Admin, "admin-tok", ADMIN_ROLE);

    Mock::given(method("GET"))
        .and(path("/api/admin/posts"))
        .and(header("authorization", "Bearer admin-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&h.server)
        .await;

    let posts = h
        .client
        .admin_posts()
        .list(&ListQuery::default())
        .await
        .unwrap();
    assert_eq!(posts["items"], json!([]));
}

#[tokio::test]
async fn test_admin_path_without_session_sends_no_authorization() {
    let h = harness("/admin/posts").await;
    sign_in(&h.credentials, Audience::Front, "front-tok", "reader");

    Mock::given(method("GET"))
        .and(path("/api/admin/posts/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
        .mount(&h.server)
        .await;

    h.client.admin_posts().detail(3).await.unwrap();

    assert_eq!(authorization_headers(&h.server).await, vec![None]);
}

#[tokio::test]
async fn test_front_path_never_carries_admin_token() {
    let h = harness("/").await;
    sign_in(&h.credentials, Audience::Admin, "admin-tok", ADMIN_ROLE);

    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&h.server)
        .await;

    h.client.posts().list(&ListQuery::default()).await.unwrap();
    assert_eq!(authorization_headers(&h.server).await, vec![None]);

    sign_in(&h.credentials, Audience::Front, "front-tok", "reader");
    h.client.posts().list(&ListQuery::default()).await.unwrap();
    assert_eq!(
        authorization_headers(&h.server).await,
        vec![None, Some("Bearer front-tok".to_string())]
    );
}

#[tokio::test]
async fn test_admin_401_clears_session_and_redirects() {
    let h = harness("/admin/comments").await;
    sign_in(&h.credentials, Audience::Admin, "stale", ADMIN_ROLE);
    sign_in(&h.credentials, Audience::Front, "front-tok", "reader");

    Mock::given(method("GET"))
        .and(path("/api/admin/comments"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&h.server)
        .await;

    let result = h.client.admin_comments().list(&ListQuery::default()).await;

    assert!(matches!(result, Err(ClientError::AuthenticationFailed(ref msg)) if msg == "token expired"));
    assert!(!h.credentials.is_authenticated(Audience::Admin));
    assert!(h.credentials.is_authenticated(Audience::Front));
    assert_eq!(h.navigator.visits(), vec!["/admin/login".to_string()]);
}

#[tokio::test]
async fn test_admin_401_outside_console_does_not_navigate() {
    let h = harness("/blog/7").await;
    sign_in(&h.credentials, Audience::Admin, "stale", ADMIN_ROLE);

    Mock::given(method("DELETE"))
        .and(path("/api/admin/tags/2"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let result = h.client.admin_tags().delete(2).await;

    assert!(result.unwrap_err().is_unauthorized());
    assert!(!h.credentials.is_authenticated(Audience::Admin));
    assert!(h.navigator.visits().is_empty());
}

#[tokio::test]
async fn test_front_401_keeps_front_session() {
    let h = harness("/admin/posts").await;
    sign_in(&h.credentials, Audience::Front, "front-tok", "reader");
    sign_in(&h.credentials, Audience::Admin, "admin-tok", ADMIN_ROLE);

    Mock::given(method("POST"))
        .and(path("/api/comments"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let result = h
        .client
        .comments()
        .create(&json!({"post_id": 1, "content": "hi"}))
        .await;

    assert!(result.unwrap_err().is_unauthorized());
    assert!(h.credentials.is_authenticated(Audience::Front));
    assert!(h.credentials.is_authenticated(Audience::Admin));
    assert!(h.navigator.visits().is_empty());
}

#[tokio::test]
async fn test_other_error_statuses_pass_through() {
    let h = harness("/admin/users").await;
    sign_in(&h.credentials, Audience::Admin, "admin-tok", ADMIN_ROLE);

    Mock::given(method("PUT"))
        .and(path("/api/admin/users/5/role"))
        .and(body_json(json!({"role": "editor"})))
        .respond_with(ResponseTemplate::new(403).set_body_string("nope"))
        .mount(&h.server)
        .await;

    let result = h.client.admin_users().update_role(5, "editor").await;

    assert!(matches!(result, Err(ClientError::Forbidden(_))));
    assert!(h.credentials.is_authenticated(Audience::Admin));
    assert!(h.navigator.visits().is_empty());
}

#[tokio::test]
async fn test_raw_send_returns_error_responses() {
    let h = harness("/").await;

    Mock::given(method("GET"))
        .and(path("/api/hotdata"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;

    let response = h.client.get("/hotdata").send().await.unwrap();
    assert_eq!(response.status().as_u16(), 500);
}

#[tokio::test]
async fn test_network_failure_propagates() {
    let credentials = Arc::new(CredentialStore::new(Arc::new(MemoryStorage::new())));
    let client = ApiClient::builder()
        .base_url("http://127.0.0.1:9/api")
        .with(BearerAuth::new(credentials))
        .build()
        .unwrap();

    let result = client.meta().tags().await;
    assert!(matches!(result, Err(ClientError::Request(_))));
}

#[tokio::test]
async fn test_default_timeout_applies_and_can_be_lifted() {
    let h = harness("/").await;

    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&h.server)
        .await;

    let result: Result<Value, _> = h
        .client
        .get("/categories")
        .timeout(RequestTimeout::Fixed(Duration::from_millis(50)))
        .execute()
        .await;
    assert!(result.unwrap_err().is_timeout());

    let result: Result<Value, _> = h
        .client
        .get("/categories")
        .timeout(RequestTimeout::Unbounded)
        .execute()
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_empty_success_body_decodes() {
    let h = harness("/admin/pages").await;

    Mock::given(method("DELETE"))
        .and(path("/api/admin/pages/4"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    let value = h.client.admin_pages().delete(4).await.unwrap();
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_login_stores_admin_session() {
    let h = harness("/admin/login").await;

    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .and(body_json(json!({"username": "ada", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "fresh",
            "user": {"id": 1, "role": "admin", "username": "ada"}
        })))
        .mount(&h.server)
        .await;

    let auth = h.client.admin_auth(&h.credentials);
    let response = auth.login("ada", "pw").await.unwrap();

    assert_eq!(response.token, "fresh");
    assert!(h.credentials.has_role(Audience::Admin, ADMIN_ROLE));
    assert_eq!(
        h.credentials.token(Audience::Admin).unwrap().as_deref(),
        Some("fresh")
    );
    assert!(!h.credentials.is_authenticated(Audience::Front));

    auth.logout().unwrap();
    assert!(!h.credentials.is_authenticated(Audience::Admin));
}

#[tokio::test]
async fn test_failed_login_leaves_no_session() {
    let h = harness("/admin/login").await;

    Mock::given(method("POST"))
        .and(path("/api/users/login"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad credentials"))
        .mount(&h.server)
        .await;

    let result = h.client.admin_auth(&h.credentials).login("ada", "wrong").await;

    assert!(matches!(result, Err(ClientError::BadRequest(_))));
    assert!(!h.credentials.is_authenticated(Audience::Admin));
}

#[tokio::test]
async fn test_post_without_image_is_json() {
    let h = harness("/admin/posts/create").await;

    let payload = PostPayload {
        title: "Hello".into(),
        content: "# Body".into(),
        category_ids: vec![1, 2],
        ..PostPayload::default()
    };

    Mock::given(method("POST"))
        .and(path("/api/admin/posts"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "title": "Hello",
            "content": "# Body",
            "category_ids": [1, 2]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 10})))
        .expect(1)
        .mount(&h.server)
        .await;

    let created = h.client.admin_posts().create(&payload, None).await.unwrap();
    assert_eq!(created["id"], 10);
}

#[tokio::test]
async fn test_post_with_image_is_multipart() {
    let h = harness("/admin/posts/edit/3").await;
    sign_in(&h.credentials, Audience::Admin, "admin-tok", ADMIN_ROLE);

    let payload = PostPayload {
        title: "Cover".into(),
        excerpt: Some("short".into()),
        content: "body".into(),
        category_ids: vec![4],
        tag_ids: vec![7, 8],
        status: Some("published".into()),
    };
    let image = ImageFile::new("cover.png", b"PNGDATA".to_vec()).with_mime("image/png");

    Mock::given(method("PUT"))
        .and(path("/api/admin/posts/3"))
        .and(header("authorization", "Bearer admin-tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 3})))
        .mount(&h.server)
        .await;

    h.client
        .admin_posts()
        .update(3, &payload, Some(&image))
        .await
        .unwrap();

    let requests = h.server.received_requests().await.unwrap();
    let content_type = requests[0].headers["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));

    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"image\"; filename=\"cover.png\""));
    assert!(body.contains("PNGDATA"));
    assert!(body.contains("name=\"excerpt\""));
    assert_eq!(body.matches("name=\"tag_ids[]\"").count(), 2);
    assert_eq!(body.matches("name=\"category_ids[]\"").count(), 1);
    assert!(body.contains("published"));
}

#[tokio::test]
async fn test_upload_image_returns_url() {
    let h = harness("/admin/posts/create").await;

    Mock::given(method("POST"))
        .and(path("/api/admin/upload/image"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"url": "/uploads/a.webp"})),
        )
        .mount(&h.server)
        .await;

    let image = ImageFile::new("a.jpg", vec![0xFF, 0xD8]);
    let uploaded = h.client.admin_upload().upload_image(&image).await.unwrap();
    assert_eq!(uploaded["url"], "/uploads/a.webp");
}

#[tokio::test]
async fn test_uploads_use_upload_timeout() {
    let server = MockServer::start().await;
    let client = ApiClient::builder()
        .base_url(format!("{}/api", server.uri()))
        .timeout(Duration::from_millis(150))
        .upload_timeout(Duration::from_secs(5))
        .build()
        .unwrap();

    let slow = || {
        ResponseTemplate::new(200)
            .set_body_json(json!({"id": 3}))
            .set_delay(Duration::from_millis(400))
    };
    Mock::given(method("POST"))
        .and(path("/api/admin/upload/image"))
        .respond_with(slow())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/admin/posts"))
        .respond_with(slow())
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/admin/posts/3"))
        .respond_with(slow())
        .mount(&server)
        .await;

    let payload = PostPayload {
        title: "Slow".into(),
        content: "body".into(),
        ..PostPayload::default()
    };
    let image = ImageFile::new("big.png", vec![0; 64]).with_mime("image/png");

    client.admin_upload().upload_image(&image).await.unwrap();
    client
        .admin_posts()
        .create(&payload, Some(&image))
        .await
        .unwrap();
    client
        .admin_posts()
        .update(3, &payload, Some(&image))
        .await
        .unwrap();

    let err = client
        .admin_posts()
        .update(3, &payload, None)
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_query_parameters_are_encoded() {
    let h = harness("/blog/1").await;

    Mock::given(method("GET"))
        .and(path("/api/like/count"))
        .and(query_param("post_id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 3})))
        .mount(&h.server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/posts"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&h.server)
        .await;

    let count = h.client.likes().count_for_post(42).await.unwrap();
    assert_eq!(count["count"], 3);
    h.client.posts().list(&ListQuery::page(2, 10)).await.unwrap();
}

#[tokio::test]
async fn test_compression_progress_stream() {
    let h = harness("/admin/posts/create").await;
    sign_in(&h.credentials, Audience::Admin, "admin-tok", ADMIN_ROLE);

    let body = concat!(
        ": connected\n\n",
        "event: progress\n",
        "data: {\"job_id\":\"j1\",\"status\":\"running\",\"percent\":50}\n\n",
        "event: progress\n",
        "data: {\"job_id\":\"j1\",\"status\":\"done\",\"percent\":100,\"url\":\"/img/j1.webp\"}\n\n",
    );

    Mock::given(method("GET"))
        .and(path("/api/admin/upload/progress"))
        .and(query_param("job_id", "j1"))
        .and(header("accept", "text/event-stream"))
        .and(header("authorization", "Bearer admin-tok"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&h.server)
        .await;

    let stream = h
        .client
        .admin_upload()
        .compression_progress("j1")
        .await
        .unwrap();
    let updates: Vec<_> = stream.collect().await;

    assert_eq!(updates.len(), 2);
    let first = updates[0].as_ref().unwrap();
    assert_eq!(first.status, JobStatus::Running);
    let last = updates[1].as_ref().unwrap();
    assert!(last.status.is_terminal());
    assert_eq!(last.url.as_deref(), Some("/img/j1.webp"));
}

#[tokio::test]
async fn test_compression_progress_unauthorized() {
    let h = harness("/admin/posts/create").await;
    sign_in(&h.credentials, Audience::Admin, "stale", ADMIN_ROLE);

    Mock::given(method("GET"))
        .and(path("/api/admin/upload/progress"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&h.server)
        .await;

    let result = h.client.admin_upload().compression_progress("j2").await;

    assert!(matches!(result, Err(ClientError::AuthenticationFailed(_))));
    assert!(!h.credentials.is_authenticated(Audience::Admin));
    assert_eq!(h.navigator.visits(), vec!["/admin/login".to_string()]);
}
