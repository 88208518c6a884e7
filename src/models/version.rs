use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteVersion {
    pub id: String,
    pub note_id: String,
    pub user_id: String,
    pub version_number: i64,
    pub annotation: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateVersionRequest {
    pub annotation: Option<String>,
}
