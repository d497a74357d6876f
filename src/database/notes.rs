use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::manager::DatabaseManager;
use super::models::{Note, NoteInput};

#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Note not found")]
    NotFound,

    #[error("Note validation failed")]
    ValidationFailed(HashMap<String, String>),

    #[error(transparent)]
    PersistenceFailed(#[from] sqlx::Error),
}

/// Note persistence, always scoped to the owning user.
///
/// A note that belongs to another user or has been soft-deleted is
/// indistinguishable from one that never existed.
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn create(&self, user_id: Uuid, input: NoteInput) -> Result<Note, NoteError>;

    /// Newest first
    async fn list(&self, user_id: Uuid) -> Result<Vec<Note>, NoteError>;

    async fn get(&self, user_id: Uuid, id: i64) -> Result<Note, NoteError>;

    async fn update(&self, user_id: Uuid, id: i64, input: NoteInput) -> Result<Note, NoteError>;

    /// Soft delete
    async fn delete(&self, user_id: Uuid, id: i64) -> Result<(), NoteError>;

    /// Case-insensitive substring match on title or content
    async fn search(&self, user_id: Uuid, query: &str) -> Result<Vec<Note>, NoteError>;

    async fn health_check(&self) -> Result<(), NoteError>;
}

const NOTE_COLUMNS: &str = "id, title, content, user_id, created_at, updated_at";

/// Escape LIKE wildcards so the query matches literally.
pub fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn create(&self, user_id: Uuid, input: NoteInput) -> Result<Note, NoteError> {
        let input = input.validated().map_err(NoteError::ValidationFailed)?;

        let sql = format!(
            "INSERT INTO notes (title, content, user_id) VALUES ($1, $2, $3) RETURNING {}",
            NOTE_COLUMNS
        );
        let note = sqlx::query_as::<_, Note>(&sql)
            .bind(&input.title)
            .bind(&input.content)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        info!("Created note {} for user {}", note.id, user_id);
        Ok(note)
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Note>, NoteError> {
        let sql = format!(
            "SELECT {} FROM notes WHERE user_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC, id DESC",
            NOTE_COLUMNS
        );
        let notes = sqlx::query_as::<_, Note>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(notes)
    }

    async fn get(&self, user_id: Uuid, id: i64) -> Result<Note, NoteError> {
        let sql = format!(
            "SELECT {} FROM notes WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
            NOTE_COLUMNS
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(NoteError::NotFound)
    }

    async fn update(&self, user_id: Uuid, id: i64, input: NoteInput) -> Result<Note, NoteError> {
        let input = input.validated().map_err(NoteError::ValidationFailed)?;

        let sql = format!(
            "UPDATE notes SET title = $1, content = $2, updated_at = now() \
             WHERE id = $3 AND user_id = $4 AND deleted_at IS NULL RETURNING {}",
            NOTE_COLUMNS
        );
        let note = sqlx::query_as::<_, Note>(&sql)
            .bind(&input.title)
            .bind(&input.content)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(NoteError::NotFound)?;

        debug!("Updated note {} for user {}", id, user_id);
        Ok(note)
    }

    async fn delete(&self, user_id: Uuid, id: i64) -> Result<(), NoteError> {
        let result = sqlx::query(
            "UPDATE notes SET deleted_at = now() WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(NoteError::NotFound);
        }

        info!("Deleted note {} for user {}", id, user_id);
        Ok(())
    }

    async fn search(&self, user_id: Uuid, query: &str) -> Result<Vec<Note>, NoteError> {
        let sql = format!(
            "SELECT {} FROM notes WHERE user_id = $1 AND deleted_at IS NULL \
             AND (title ILIKE $2 ESCAPE '\\' OR content ILIKE $2 ESCAPE '\\') \
             ORDER BY created_at DESC, id DESC",
            NOTE_COLUMNS
        );
        let notes = sqlx::query_as::<_, Note>(&sql)
            .bind(user_id)
            .bind(like_pattern(query))
            .fetch_all(&self.pool)
            .await?;
        Ok(notes)
    }

    async fn health_check(&self) -> Result<(), NoteError> {
        DatabaseManager::health_check(&self.pool).await?;
        Ok(())
    }
}
