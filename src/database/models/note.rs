use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;
use uuid::Uuid;

pub const MAX_TITLE_LEN: usize = 255;

/// A live (not soft-deleted) note. `deleted_at` stays in the table only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of POST /notes and PUT /notes/:id
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl NoteInput {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Trim the title and check it is present and fits the column.
    pub fn validated(self) -> Result<Self, HashMap<String, String>> {
        let title = self.title.trim().to_string();
        let mut errors = HashMap::new();

        if title.is_empty() {
            errors.insert("title".to_string(), "This field is required".to_string());
        } else if title.chars().count() > MAX_TITLE_LEN {
            errors.insert(
                "title".to_string(),
                format!("Must be at most {} characters", MAX_TITLE_LEN),
            );
        }

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(Self {
            title,
            content: self.content,
        })
    }
}
