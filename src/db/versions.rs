use crate::error::AppError;
use crate::models::{Note, NoteVersion};
use sqlx::SqlitePool;

/// 노트의 현재 제목/내용을 버전 스냅샷으로 기록합니다.
///
/// 버전 번호는 노트별 최대값 + 1이고, 첫 버전은 0입니다.
/// 중간 버전이 삭제돼 구멍이 생겨도 번호는 앞으로만 나아갑니다.
pub async fn create_version(
    pool: &SqlitePool,
    note: &Note,
    annotation: &str,
) -> Result<NoteVersion, AppError> {
    let id = uuid::Uuid::now_v7().to_string();
    let next_version: i64 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(version_number), -1) + 1 FROM note_versions WHERE note_id = ?",
    )
    .bind(&note.id)
    .fetch_one(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO note_versions (id, note_id, user_id, version_number, annotation, title, content)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&note.id)
    .bind(&note.user_id)
    .bind(next_version)
    .bind(annotation)
    .bind(&note.title)
    .bind(&note.content)
    .execute(pool)
    .await?;

    let version = sqlx::query_as::<_, NoteVersion>(
        r#"
        SELECT id, note_id, user_id, version_number, annotation, title, content, created_at
        FROM note_versions
        WHERE id = ?
        "#,
    )
    .bind(&id)
    .fetch_one(pool)
    .await?;

    Ok(version)
}

/// 노트의 버전 목록을 번호 내림차순(최신 먼저)으로 조회합니다.
pub async fn list_versions(
    pool: &SqlitePool,
    note_id: &str,
    user_id: &str,
) -> Result<Vec<NoteVersion>, AppError> {
    let versions = sqlx::query_as::<_, NoteVersion>(
        r#"
        SELECT id, note_id, user_id, version_number, annotation, title, content, created_at
        FROM note_versions
        WHERE note_id = ? AND user_id = ?
        ORDER BY version_number DESC
        "#,
    )
    .bind(note_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(versions)
}

pub async fn get_version(
    pool: &SqlitePool,
    version_id: &str,
    user_id: &str,
) -> Result<Option<NoteVersion>, AppError> {
    let version = sqlx::query_as::<_, NoteVersion>(
        r#"
        SELECT id, note_id, user_id, version_number, annotation, title, content, created_at
        FROM note_versions
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(version_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(version)
}

pub async fn delete_version(
    pool: &SqlitePool,
    version_id: &str,
    user_id: &str,
) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM note_versions WHERE id = ? AND user_id = ?")
        .bind(version_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::notes::create_note;
    use crate::models::CreateNoteRequest;
    use sqlx::sqlite::SqlitePoolOptions;

    const OWNER: &str = "user-owner";
    const INTRUDER: &str = "user-intruder";

    async fn setup() -> (SqlitePool, Note) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migrations");

        for (id, email) in [(OWNER, "owner@example.com"), (INTRUDER, "other@example.com")] {
            sqlx::query("INSERT INTO users (id, email, password_hash) VALUES (?, ?, ?)")
                .bind(id)
                .bind(email)
                .bind("hash")
                .execute(&pool)
                .await
                .expect("seed user");
        }

        let req = CreateNoteRequest {
            title: Some("Subject".to_string()),
            content: Some("first draft".to_string()),
        };
        let note = create_note(&pool, &uuid::Uuid::now_v7().to_string(), OWNER, &req)
            .await
            .expect("seed note");

        (pool, note)
    }

    #[tokio::test]
    async fn first_version_is_number_zero() {
        let (pool, note) = setup().await;
        let version = create_version(&pool, &note, "initial").await.unwrap();

        assert_eq!(version.version_number, 0);
        assert_eq!(version.note_id, note.id);
        assert_eq!(version.annotation, "initial");
        assert_eq!(version.title, "Subject");
        assert_eq!(version.content, "first draft");
    }

    #[tokio::test]
    async fn numbering_increments_past_deleted_versions() {
        let (pool, note) = setup().await;
        let _v0 = create_version(&pool, &note, "v0").await.unwrap();
        let v1 = create_version(&pool, &note, "v1").await.unwrap();
        let v2 = create_version(&pool, &note, "v2").await.unwrap();
        assert_eq!(v2.version_number, 2);

        // 중간 버전을 지워 구멍을 내도 다음 번호는 max + 1
        assert!(delete_version(&pool, &v1.id, OWNER).await.unwrap());
        let v3 = create_version(&pool, &note, "v3").await.unwrap();
        assert_eq!(v3.version_number, 3);
    }

    #[tokio::test]
    async fn list_returns_newest_number_first() {
        let (pool, note) = setup().await;
        for annotation in ["a", "b", "c"] {
            create_version(&pool, &note, annotation).await.unwrap();
        }

        let versions = list_versions(&pool, &note.id, OWNER).await.unwrap();
        let numbers: Vec<i64> = versions.iter().map(|v| v.version_number).collect();
        assert_eq!(numbers, vec![2, 1, 0]);
    }

    #[tokio::test]
    async fn versions_are_scoped_to_their_owner() {
        let (pool, note) = setup().await;
        let version = create_version(&pool, &note, "mine").await.unwrap();

        assert!(get_version(&pool, &version.id, OWNER).await.unwrap().is_some());
        assert!(get_version(&pool, &version.id, INTRUDER)
            .await
            .unwrap()
            .is_none());
        assert!(!delete_version(&pool, &version.id, INTRUDER).await.unwrap());
        assert!(list_versions(&pool, &note.id, INTRUDER)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn delete_removes_the_version() {
        let (pool, note) = setup().await;
        let version = create_version(&pool, &note, "to delete").await.unwrap();

        assert!(delete_version(&pool, &version.id, OWNER).await.unwrap());
        assert!(get_version(&pool, &version.id, OWNER).await.unwrap().is_none());
        // 두 번째 삭제는 지울 것이 없다
        assert!(!delete_version(&pool, &version.id, OWNER).await.unwrap());
    }
}
