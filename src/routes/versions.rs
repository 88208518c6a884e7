use crate::{
    db,
    error::AppError,
    middleware::auth::AuthUser,
    models::CreateVersionRequest,
    validation::MAX_ANNOTATION_LENGTH,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use super::notes::{ensure_uuid, AppState};

/// `GET /versions/note/{note_id}` — 노트의 버전 목록 (최신 번호 먼저)
///
/// 쿼리가 note_id와 user_id로 함께 한정되므로, 없는 노트든 남의 노트든
/// 결과는 똑같이 빈 배열입니다.
pub async fn list_note_versions(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(note_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_uuid(&note_id)?;

    let versions = db::list_versions(&state.pool, &note_id, &auth_user.user_id).await?;
    Ok(Json(json!({ "success": true, "data": versions })))
}

/// `POST /versions/note/{note_id}` — 현재 노트 내용을 버전으로 저장합니다.
///
/// 주석(annotation)은 필수이며 500자를 넘을 수 없습니다.
/// 저장 시 앞뒤 공백은 잘라냅니다.
pub async fn create_version(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(note_id): Path<String>,
    req: Option<Json<CreateVersionRequest>>,
) -> Result<Json<Value>, AppError> {
    ensure_uuid(&note_id)?;

    let annotation = req
        .and_then(|Json(req)| req.annotation)
        .unwrap_or_default();
    let annotation = annotation.as_str();

    if annotation.trim().is_empty() {
        return Err(AppError::BadRequest("Annotation is required".to_string()));
    }
    if annotation.chars().count() > MAX_ANNOTATION_LENGTH {
        return Err(AppError::BadRequest(
            "Annotation must not exceed 500 characters".to_string(),
        ));
    }

    // 소유권 확인: 삭제됐거나 남의 노트면 스냅샷을 만들 수 없습니다.
    let note = db::get_note(&state.pool, &note_id, &auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound("Note"))?;

    let version = db::create_version(&state.pool, &note, annotation.trim()).await?;
    tracing::debug!(
        "Version {} created for note {}",
        version.version_number,
        note.id
    );

    let message = format!("Version {} created successfully", version.version_number);
    Ok(Json(json!({
        "success": true,
        "data": version,
        "message": message,
    })))
}

/// `GET /versions/{id}` — 버전 스냅샷 하나를 조회합니다.
pub async fn get_version(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_uuid(&id)?;

    let version = db::get_version(&state.pool, &id, &auth_user.user_id)
        .await?
        .ok_or(AppError::NotFound("Version"))?;
    Ok(Json(json!({ "success": true, "data": version })))
}

/// `DELETE /versions/{id}` — 버전 하나를 삭제합니다.
///
/// 중간 버전을 지우면 번호에 구멍이 생기지만, 다음 버전 번호는
/// 언제나 최대값 + 1이므로 번호가 재사용되는 일은 없습니다.
pub async fn delete_version(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    ensure_uuid(&id)?;

    let deleted = db::delete_version(&state.pool, &id, &auth_user.user_id).await?;
    if !deleted {
        return Err(AppError::NotFound("Version"));
    }

    Ok(Json(
        json!({ "success": true, "message": "Version deleted successfully" }),
    ))
}
