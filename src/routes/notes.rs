//! # 노트(Note) 라우트 핸들러
//!
//! 노트의 CRUD(생성/조회/수정/삭제)와 휴지통 복구를 처리하는
//! HTTP 핸들러 함수들입니다.
//!
//! ## 엔드포인트
//! - `GET    /api/notes`              → 노트 목록 조회 (최근 수정순)
//! - `POST   /api/notes`              → 새 노트 생성
//! - `GET    /api/notes/{id}`         → 단일 노트 조회
//! - `PUT    /api/notes/{id}`         → 노트 수정 (부분 업데이트)
//! - `DELETE /api/notes/{id}`         → 노트 삭제 (soft delete)
//! - `POST   /api/notes/{id}/restore` → 휴지통에서 복구
//!
//! ## Axum 핸들러 패턴
//! Axum 핸들러는 **Extractor(추출기)**를 매개변수로 받습니다.
//! Extractor는 HTTP 요청에서 데이터를 자동으로 추출합니다:
//! - `State(state)`: 앱 전역 상태 (DB 풀, 설정 등)
//! - `auth_user`: Authorization 헤더의 Bearer 토큰을 검증해 사용자를 식별
//! - `Path(id)`: URL 경로 파라미터 (예: /notes/{id}에서 id)
//! - `Json(body)`: 요청 본문을 JSON으로 파싱하여 구조체로 변환
//!
//! 반환 타입이 `Result<T, AppError>`이면, Axum이 자동으로:
//! - `Ok(T)` → T를 HTTP 응답으로 변환 (IntoResponse 트레이트 사용)
//! - `Err(AppError)` → AppError를 에러 JSON 응답으로 변환
//!
//! 모든 응답은 `{ "success": true, "data": ... }` 봉투를 사용합니다.
//! 경로의 id는 스토어를 조회하기 전에 UUID 형식부터 검사합니다.

use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    middleware::rate_limit::RateLimiter,
    models::*,
    validation,
};
use axum::{
    extract::{Path, State}, // Axum Extractor: 요청에서 데이터 추출
    http::StatusCode,       // HTTP 상태 코드 (200, 201, 404 등)
    Json,                   // JSON 요청/응답 래퍼
};
use serde_json::{json, Value}; // JSON 값 생성 유틸리티
use sqlx::SqlitePool;          // SQLite 연결 풀 타입
use std::sync::Arc;

// #[derive(Clone)]: AppState가 Clone 트레이트를 구현하게 합니다.
// Axum의 State Extractor는 내부적으로 AppState를 clone하므로 필수입니다.
// SqlitePool은 Arc<내부상태>를 사용하므로 clone해도 실제 풀이 복제되지 않습니다.

/// 애플리케이션 공유 상태
///
/// 모든 요청 핸들러가 `State(state): State<AppState>`로 접근합니다.
/// Axum의 의존성 주입(Dependency Injection) 메커니즘입니다.
#[derive(Clone)]
pub struct AppState {
    /// SQLite 연결 풀 (내부적으로 Arc로 공유)
    pub pool: SqlitePool,
    /// JWT 토큰 서명용 비밀키
    pub jwt_secret: String,
    /// 인증 엔드포인트용 속도 제한기 (15분에 5회)
    pub auth_limiter: Arc<RateLimiter>,
    /// 일반 API용 속도 제한기 (1분에 100회)
    pub api_limiter: Arc<RateLimiter>,
}

/// 경로 파라미터가 UUID 형태가 아니면 스토어까지 가지 않고 400으로 끊습니다.
pub(super) fn ensure_uuid(id: &str) -> Result<(), AppError> {
    if validation::is_valid_uuid(id) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid ID format".to_string()))
    }
}

/// `GET /notes` — 내 노트 목록을 조회합니다. (휴지통 제외, 최근 수정순)
///
/// # Extractor
/// - `State(state)`: 구조 분해(destructuring) 패턴으로 AppState를 바로 추출합니다.
/// - `auth_user`: 토큰 검증에 실패하면 핸들러 본문이 실행되기 전에 401이 반환됩니다.
pub async fn list_notes(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Value>, AppError> {
    // &state.pool: 풀의 참조를 전달 (소유권 이동 없이 빌려줌)
    let notes = db::list_notes(&state.pool, &auth_user.user_id).await?;
    Ok(Json(json!({ "success": true, "data": notes })))
}

/// `GET /notes/{id}` — 단일 노트를 조회합니다.
///
/// # Extractor
/// - `Path(id)`: URL의 `{id}` 부분을 String으로 추출합니다.
pub async fn get_note(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_uuid(&id)?;

    let note = db::get_note(&state.pool, &id, &auth_user.user_id)
        .await?
        // .ok_or(): Option이 None이면 지정한 에러를 반환합니다.
        // 없는 노트와 남의 노트 모두 같은 404가 됩니다.
        .ok_or(AppError::NotFound("Note"))?;
    Ok(Json(json!({ "success": true, "data": note })))
}

/// `POST /notes` — 새 노트를 생성합니다.
///
/// 본문은 생략 가능합니다. 본문이 없으면 제목 "Untitled", 내용 ""으로 만듭니다.
///
/// # Extractor
/// - `Option<Json<...>>`: 본문이 아예 없는 요청(Content-Type 미지정)은 None이 됩니다.
pub async fn create_note(
    State(state): State<AppState>,
    auth_user: AuthUser,
    req: Option<Json<CreateNoteRequest>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let req = req.map(|Json(req)| req).unwrap_or_default();

    // .as_deref(): Option<String>을 Option<&str>로 변환합니다.
    let errors = validation::validate_note_payload(req.title.as_deref(), req.content.as_deref());
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let id = uuid::Uuid::now_v7().to_string();
    tracing::debug!("Creating note {} for user {}", id, auth_user.user_id);

    let note = db::create_note(&state.pool, &id, &auth_user.user_id, &req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": note })),
    ))
}

/// `PUT /notes/{id}` — 노트를 수정합니다.
///
/// 요청 본문에 포함된 필드만 업데이트합니다 (부분 업데이트).
/// 예: `{ "title": "새 제목" }`으로 제목만 변경 가능
pub async fn update_note(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<Json<Value>, AppError> {
    ensure_uuid(&id)?;

    let errors = validation::validate_note_payload(req.title.as_deref(), req.content.as_deref());
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let note = db::update_note(&state.pool, &id, &auth_user.user_id, &req)
        .await?
        .ok_or(AppError::NotFound("Note"))?; // 노트가 없으면 404
    Ok(Json(json!({ "success": true, "data": note })))
}

/// `DELETE /notes/{id}` — 노트를 휴지통으로 보냅니다 (soft delete).
///
/// 행을 지우지 않고 플래그만 올리므로, restore로 id와 내용을
/// 그대로 되살릴 수 있습니다.
pub async fn delete_note(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_uuid(&id)?;

    let deleted = db::soft_delete_note(&state.pool, &id, &auth_user.user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Note"));
    }

    Ok(Json(
        json!({ "success": true, "message": "Note deleted successfully" }),
    ))
}

/// `POST /notes/{id}/restore` — 휴지통의 노트를 복구합니다.
///
/// 복구된 노트를 그대로 돌려주므로, 클라이언트는 응답만으로
/// 목록 맨 앞에 다시 끼워 넣을 수 있습니다.
pub async fn restore_note(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_uuid(&id)?;

    let note = db::restore_note(&state.pool, &id, &auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound("Note"))?;
    Ok(Json(json!({ "success": true, "data": note })))
}
