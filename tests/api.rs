//! # API 통합 테스트
//!
//! 실제 서버 조립과 같은 라우터(`api_router`)를 인메모리 SQLite 위에 띄우고,
//! tower의 `oneshot`으로 HTTP 요청을 직접 흘려보냅니다.
//! 소켓을 열지 않으므로 빠르고, 테스트마다 독립된 DB를 사용합니다.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::util::ServiceExt;

use notemark::middleware::rate_limit::{RateLimitPolicy, RateLimiter};
use notemark::routes::{api_router, notes::AppState};

/// 마이그레이션이 적용된 인메모리 DB 위에 전체 앱을 조립합니다.
///
/// `/api` 중첩까지 포함해 프로덕션 라우팅과 같은 모양입니다.
async fn test_app() -> Router {
    // 인메모리 SQLite는 연결마다 별도 DB가 되므로 연결을 1개로 고정합니다.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let state = AppState {
        pool,
        jwt_secret: "integration-test-secret".to_string(),
        auth_limiter: Arc::new(RateLimiter::new(RateLimitPolicy::auth())),
        api_limiter: Arc::new(RateLimiter::new(RateLimitPolicy::api())),
    };

    Router::new().nest("/api", api_router(state))
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("infallible")
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = send(app, request).await;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}

/// 가입 후 access 토큰을 돌려줍니다.
async fn signup(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send_json(
        app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": email, "password": password })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);
    body["data"]["session"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string()
}

async fn create_note(app: &Router, token: &str, title: &str, content: &str) -> String {
    let (status, body) = send_json(
        app,
        json_request(
            "POST",
            "/api/notes",
            Some(token),
            Some(json!({ "title": title, "content": content })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create note failed: {}", body);
    body["data"]["id"].as_str().expect("note id").to_string()
}

// ── 인증 ─────────────────────────────────────────────────────────

#[tokio::test]
async fn signup_returns_user_and_session() {
    let app = test_app().await;

    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": "Ada@Example.com ", "password": "hunter22" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    // 이메일은 소문자/trim으로 정규화되어 저장됩니다.
    assert_eq!(body["data"]["user"]["email"], json!("ada@example.com"));
    // 해시는 어떤 응답에도 실리지 않습니다.
    assert!(body["data"]["user"].get("password_hash").is_none());

    let session = &body["data"]["session"];
    assert_eq!(session["token_type"], json!("bearer"));
    assert_eq!(session["expires_in"], json!(900));
    assert!(session["access_token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(session["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn signup_rejects_duplicate_email() {
    let app = test_app().await;
    signup(&app, "dup@example.com", "hunter22").await;

    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": "dup@example.com", "password": "hunter22" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("User already registered"));
}

#[tokio::test]
async fn signin_does_not_reveal_which_credential_was_wrong() {
    let app = test_app().await;
    signup(&app, "ada@example.com", "hunter22").await;

    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "email": "ada@example.com", "password": "hunter22" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["session"]["access_token"].as_str().is_some());

    // 비밀번호 오류와 미등록 이메일이 같은 응답으로 수렴해야 합니다.
    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-pass" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Invalid login credentials"));

    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "whatever99" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Invalid login credentials"));
}

#[tokio::test]
async fn signin_validates_credential_shape() {
    let app = test_app().await;

    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "email": "not-an-email", "password": "hunter22" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Validation failed"));
    assert_eq!(body["errors"][0]["field"], json!("email"));
}

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let app = test_app().await;

    let (status, body) = send_json(&app, json_request("GET", "/api/notes", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("No authorization token provided"));

    let (status, body) = send_json(
        &app,
        json_request("GET", "/api/notes", Some("not-a-jwt"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Invalid or expired token"));
}

#[tokio::test]
async fn refresh_rotates_and_signout_revokes() {
    let app = test_app().await;

    let (_, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "email": "ada@example.com", "password": "hunter22" })),
        ),
    )
    .await;
    let first_refresh = body["data"]["session"]["refresh_token"]
        .as_str()
        .expect("refresh token")
        .to_string();

    // 갱신은 새 토큰 쌍을 발급하고
    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": first_refresh })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second_access = body["data"]["session"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string();
    let second_refresh = body["data"]["session"]["refresh_token"]
        .as_str()
        .expect("refresh token")
        .to_string();
    assert_ne!(first_refresh, second_refresh);

    // 사용된 refresh 토큰은 더 이상 쓸 수 없습니다 (단일 사용).
    let (status, _) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": first_refresh })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 로그아웃은 남아 있는 refresh 토큰을 전부 무효화합니다.
    let (status, _) = send_json(
        &app,
        json_request("POST", "/api/auth/signout", Some(&second_access), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": second_refresh })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn change_password_requires_current_and_revokes_old_credentials() {
    let app = test_app().await;
    let token = signup(&app, "ada@example.com", "hunter22").await;

    let (status, body) = send_json(
        &app,
        json_request(
            "PUT",
            "/api/auth/password",
            Some(&token),
            Some(json!({ "currentPassword": "wrong-pass", "newPassword": "betterpass9" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], json!("Current password is incorrect"));

    let (status, body) = send_json(
        &app,
        json_request(
            "PUT",
            "/api/auth/password",
            Some(&token),
            Some(json!({ "currentPassword": "hunter22", "newPassword": "betterpass9" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Password updated successfully"));

    // 예전 비밀번호는 막히고 새 비밀번호로는 로그인됩니다.
    let (status, _) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "email": "ada@example.com", "password": "hunter22" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send_json(
        &app,
        json_request(
            "POST",
            "/api/auth/signin",
            None,
            Some(json!({ "email": "ada@example.com", "password": "betterpass9" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn change_email_is_staged_until_confirmed() {
    let app = test_app().await;
    let token = signup(&app, "ada@example.com", "hunter22").await;
    signup(&app, "taken@example.com", "hunter22").await;

    // 이미 다른 계정이 쓰는 주소는 거부됩니다.
    let (status, body) = send_json(
        &app,
        json_request(
            "PUT",
            "/api/auth/email",
            Some(&token),
            Some(json!({ "newEmail": "taken@example.com" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Email already in use"));

    let (status, body) = send_json(
        &app,
        json_request(
            "PUT",
            "/api/auth/email",
            Some(&token),
            Some(json!({ "newEmail": "Ada.New@Example.com" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        json!("Verification email sent to the new address")
    );
    // 확인 전에는 로그인 주소가 바뀌지 않고 pending에만 올라갑니다.
    assert_eq!(body["data"]["user"]["email"], json!("ada@example.com"));
    assert_eq!(
        body["data"]["user"]["pending_email"],
        json!("ada.new@example.com")
    );
}

// ── 노트 ─────────────────────────────────────────────────────────

#[tokio::test]
async fn note_crud_round_trip() {
    let app = test_app().await;
    let token = signup(&app, "ada@example.com", "hunter22").await;

    let id = create_note(&app, &token, "First note", "hello world").await;

    let (status, body) = send_json(&app, json_request("GET", "/api/notes", Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["title"], json!("First note"));

    let uri = format!("/api/notes/{}", id);
    let (status, body) = send_json(&app, json_request("GET", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], json!("hello world"));

    // 부분 업데이트: 보낸 필드만 바뀝니다.
    let (status, body) = send_json(
        &app,
        json_request("PUT", &uri, Some(&token), Some(json!({ "title": "Renamed" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], json!("Renamed"));
    assert_eq!(body["data"]["content"], json!("hello world"));
}

#[tokio::test]
async fn create_note_without_body_uses_defaults() {
    let app = test_app().await;
    let token = signup(&app, "ada@example.com", "hunter22").await;

    let (status, body) = send_json(&app, json_request("POST", "/api/notes", Some(&token), None)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["title"], json!("Untitled"));
    assert_eq!(body["data"]["content"], json!(""));
}

#[tokio::test]
async fn malformed_note_ids_are_rejected_before_the_db() {
    let app = test_app().await;
    let token = signup(&app, "ada@example.com", "hunter22").await;

    let (status, body) = send_json(
        &app,
        json_request("GET", "/api/notes/not-a-uuid", Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid ID format"));

    let (status, body) = send_json(
        &app,
        json_request(
            "PUT",
            "/api/notes/12345",
            Some(&token),
            Some(json!({ "title": "x" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Invalid ID format"));
}

#[tokio::test]
async fn oversized_titles_fail_validation() {
    let app = test_app().await;
    let token = signup(&app, "ada@example.com", "hunter22").await;

    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            "/api/notes",
            Some(&token),
            Some(json!({ "title": "t".repeat(201) })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Validation failed"));
    assert_eq!(body["errors"][0]["field"], json!("title"));
}

#[tokio::test]
async fn notes_are_scoped_to_their_owner() {
    let app = test_app().await;
    let ada = signup(&app, "ada@example.com", "hunter22").await;
    let eve = signup(&app, "eve@example.com", "hunter22").await;

    let id = create_note(&app, &ada, "Private", "secret").await;

    // 남의 노트는 존재 여부조차 알 수 없어야 합니다: 404 하나로 수렴.
    let uri = format!("/api/notes/{}", id);
    let (status, body) = send_json(&app, json_request("GET", &uri, Some(&eve), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Note not found"));

    let (status, _) = send_json(
        &app,
        json_request("DELETE", &uri, Some(&eve), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send_json(&app, json_request("GET", "/api/notes", Some(&eve), None)).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn deleted_notes_disappear_until_restored() {
    let app = test_app().await;
    let token = signup(&app, "ada@example.com", "hunter22").await;
    let id = create_note(&app, &token, "Draft", "words").await;
    let uri = format!("/api/notes/{}", id);

    let (status, body) = send_json(&app, json_request("DELETE", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Note deleted successfully"));

    // 휴지통에 있는 동안에는 목록에도 조회에도 나오지 않습니다.
    let (status, _) = send_json(&app, json_request("GET", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = send_json(&app, json_request("GET", "/api/notes", Some(&token), None)).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));

    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            &format!("/api/notes/{}/restore", id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(id));
    assert_eq!(body["data"]["content"], json!("words"));

    let (_, body) = send_json(&app, json_request("GET", "/api/notes", Some(&token), None)).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

// ── 버전 ─────────────────────────────────────────────────────────

#[tokio::test]
async fn version_numbers_count_up_from_zero() {
    let app = test_app().await;
    let token = signup(&app, "ada@example.com", "hunter22").await;
    let id = create_note(&app, &token, "Doc", "v0 body").await;
    let uri = format!("/api/versions/note/{}", id);

    let (status, body) = send_json(
        &app,
        json_request("POST", &uri, Some(&token), Some(json!({ "annotation": "first" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Version 0 created successfully"));

    let (_, body) = send_json(
        &app,
        json_request("POST", &uri, Some(&token), Some(json!({ "annotation": "second" }))),
    )
    .await;
    assert_eq!(body["message"], json!("Version 1 created successfully"));

    // 목록은 최신 번호가 먼저 옵니다.
    let (status, body) = send_json(&app, json_request("GET", &uri, Some(&token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["version_number"], json!(1));
    assert_eq!(body["data"][1]["version_number"], json!(0));

    // 스냅샷은 생성 시점의 내용을 그대로 보존합니다.
    let version_id = body["data"][1]["id"].as_str().expect("version id").to_string();
    let (status, body) = send_json(
        &app,
        json_request("GET", &format!("/api/versions/{}", version_id), Some(&token), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], json!("v0 body"));

    let (status, body) = send_json(
        &app,
        json_request(
            "DELETE",
            &format!("/api/versions/{}", version_id),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Version deleted successfully"));
}

#[tokio::test]
async fn version_annotation_is_required_and_bounded() {
    let app = test_app().await;
    let token = signup(&app, "ada@example.com", "hunter22").await;
    let id = create_note(&app, &token, "Doc", "body").await;
    let uri = format!("/api/versions/note/{}", id);

    let (status, body) = send_json(
        &app,
        json_request("POST", &uri, Some(&token), Some(json!({ "annotation": "   " }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Annotation is required"));

    let (status, body) = send_json(
        &app,
        json_request(
            "POST",
            &uri,
            Some(&token),
            Some(json!({ "annotation": "a".repeat(501) })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Annotation must not exceed 500 characters")
    );
}

#[tokio::test]
async fn listing_versions_of_an_absent_note_returns_an_empty_array() {
    let app = test_app().await;
    let token = signup(&app, "ada@example.com", "hunter22").await;

    let ghost = uuid::Uuid::now_v7().to_string();
    let (status, body) = send_json(
        &app,
        json_request("GET", &format!("/api/versions/note/{}", ghost), Some(&token), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}

// ── 속도 제한과 헬스체크 ─────────────────────────────────────────

#[tokio::test]
async fn auth_endpoints_lock_out_after_five_attempts() {
    let app = test_app().await;
    let attempt = json!({ "email": "ada@example.com", "password": "wrong-pass" });

    for _ in 0..5 {
        let (status, _) = send_json(
            &app,
            json_request("POST", "/api/auth/signin", None, Some(attempt.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    // 6번째 시도부터 같은 클라이언트는 차단됩니다.
    let response = send(
        &app,
        json_request("POST", "/api/auth/signin", None, Some(attempt.clone())),
    )
    .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("Retry-After header");
    assert!(retry_after > 0 && retry_after <= 15 * 60);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["success"], json!(false));
    assert_eq!(
        body["error"],
        json!("Too many login attempts, please try again later")
    );
    assert_eq!(body["retryAfter"], json!(retry_after));

    // 다른 클라이언트(키)는 영향을 받지 않습니다.
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/signin")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::from(attempt.to_string()))
        .expect("request");
    let (status, _) = send_json(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_check_needs_no_token() {
    let app = test_app().await;

    let (status, body) = send_json(&app, json_request("GET", "/api/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert!(body["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
}
