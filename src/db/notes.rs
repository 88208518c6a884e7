//! # 노트 데이터베이스 쿼리 모듈
//!
//! `notes` 테이블에 대한 CRUD 쿼리 함수들이 정의되어 있습니다.
//!
//! 모든 함수는 `async`이며 `SqlitePool`을 받아 데이터베이스와 상호작용합니다.
//! 모든 쿼리는 `user_id`로 범위를 한정합니다(owner scoping).
//! 다른 사용자의 노트는 "없는 노트"와 똑같이 보입니다 — 존재 여부조차
//! 구분해서 알려주지 않습니다.
//!
//! 삭제는 soft delete입니다: 행을 지우지 않고 `is_deleted` 플래그만 올려서,
//! 복구 엔드포인트가 id와 내용을 그대로 되살릴 수 있게 합니다.

use crate::error::AppError;
use crate::models::*;
// SqlitePool: SQLite 연결 풀. 여러 비동기 작업이 동시에 DB에 접근할 수 있게 합니다.
use sqlx::SqlitePool;

/// 사용자의 노트 전체를 조회합니다. (휴지통 제외)
///
/// 최근 수정된 노트가 먼저 오도록 updated_at 내림차순으로 정렬합니다.
///
/// # 반환값
/// - `Result<Vec<Note>, AppError>`: 성공 시 노트 목록, 실패 시 에러
pub async fn list_notes(pool: &SqlitePool, user_id: &str) -> Result<Vec<Note>, AppError> {
    // sqlx::query_as::<_, Note>():
    //   SQL 쿼리를 실행하고 결과를 Note 구조체로 자동 변환합니다.
    //   Note에 #[derive(sqlx::FromRow)]가 있어서 자동 변환이 가능합니다.
    let notes = sqlx::query_as::<_, Note>(
        r#"
        SELECT id, user_id, title, content, is_deleted, created_at, updated_at
        FROM notes
        WHERE user_id = ? AND is_deleted = 0
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(notes)
}

/// ID로 단일 노트를 조회합니다. (본인 소유 + 휴지통 아님)
///
/// # 반환값
/// - `Ok(Some(Note))`: 노트를 찾은 경우
/// - `Ok(None)`: 없거나, 삭제됐거나, 다른 사용자의 노트인 경우 (전부 동일하게 None)
pub async fn get_note(pool: &SqlitePool, id: &str, user_id: &str) -> Result<Option<Note>, AppError> {
    let note = sqlx::query_as::<_, Note>(
        r#"
        SELECT id, user_id, title, content, is_deleted, created_at, updated_at
        FROM notes
        WHERE id = ? AND user_id = ? AND is_deleted = 0
        "#,
        // ↑ SQL의 `?`는 파라미터 바인딩 자리표시자입니다.
        //   .bind()로 값을 안전하게 대입해 SQL 인젝션을 방지합니다.
    )
    .bind(id)
    .bind(user_id)
    // .fetch_optional(): 결과가 0행이면 None, 1행이면 Some(Note)을 반환합니다.
    .fetch_optional(pool)
    .await?;

    Ok(note)
}

/// 새 노트를 생성합니다.
///
/// 본문 필드가 생략되면 제목은 "Untitled", 내용은 빈 문자열이 됩니다.
/// (빈 문자열을 명시적으로 보낸 경우에는 그대로 저장합니다)
pub async fn create_note(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    req: &CreateNoteRequest,
) -> Result<Note, AppError> {
    let title = req.title.clone().unwrap_or_else(|| "Untitled".to_string());
    let content = req.content.clone().unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO notes (id, user_id, title, content)
        VALUES (?, ?, ?, ?)
        "#,
        // ↑ 나머지 컬럼(is_deleted, created_at 등)은 DEFAULT 값이 사용됩니다.
    )
    .bind(id)
    .bind(user_id)
    .bind(&title)
    .bind(&content)
    .execute(pool)
    .await?;

    get_note(pool, id, user_id)
        .await?
        .ok_or(AppError::Internal("Failed to retrieve created note".to_string()))
}

/// 노트를 수정합니다 (부분 업데이트).
///
/// 요청에 포함된 필드만 업데이트하고, 나머지는 그대로 유지합니다.
/// 동적으로 SQL UPDATE 쿼리를 구성합니다.
///
/// # 반환값
/// - `Ok(Some(Note))`: 수정 성공
/// - `Ok(None)`: 없거나 본인 노트가 아님
pub async fn update_note(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    req: &UpdateNoteRequest,
) -> Result<Option<Note>, AppError> {
    // 먼저 노트가 존재하는지(그리고 본인 것인지) 확인
    let note = get_note(pool, id, user_id).await?;
    if note.is_none() {
        return Ok(None); // 라우트 핸들러에서 404로 변환
    }

    // ── 동적 쿼리 구성 ──
    // 클라이언트가 보낸 필드만 SET 절에 포함합니다.
    // updated_at은 항상 갱신합니다.
    let mut query =
        String::from("UPDATE notes SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')");
    let mut bindings = Vec::new();

    if let Some(title) = &req.title {
        query.push_str(", title = ?");
        bindings.push(title.as_str());
    }

    if let Some(content) = &req.content {
        query.push_str(", content = ?");
        bindings.push(content.as_str());
    }

    query.push_str(" WHERE id = ? AND user_id = ?");
    bindings.push(id);
    bindings.push(user_id);

    // 동적으로 구성한 SQL 문자열로 쿼리를 만들고 순서대로 바인딩합니다.
    let mut query_builder = sqlx::query(&query);
    for binding in bindings {
        query_builder = query_builder.bind(binding);
    }

    query_builder.execute(pool).await?;

    // 수정된 노트를 다시 조회하여 반환 (최신 updated_at 값 포함)
    get_note(pool, id, user_id).await
}

/// 노트를 휴지통으로 보냅니다 (soft delete).
///
/// # 반환값
/// - `Ok(true)`: 삭제 성공
/// - `Ok(false)`: 없거나, 이미 삭제됐거나, 본인 노트가 아님
pub async fn soft_delete_note(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE notes
        SET is_deleted = 1, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND user_id = ? AND is_deleted = 0
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// 휴지통의 노트를 복구합니다.
///
/// # 반환값
/// - `Ok(Some(Note))`: 복구된 노트 (id와 내용이 삭제 전 그대로)
/// - `Ok(None)`: 휴지통에 해당 노트가 없음
pub async fn restore_note(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<Option<Note>, AppError> {
    let result = sqlx::query(
        r#"
        UPDATE notes
        SET is_deleted = 0, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND user_id = ? AND is_deleted = 1
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    get_note(pool, id, user_id).await
}
