use uuid::Uuid;

use crate::auth::Identity;
use crate::error::ApiError;

/// Notes are owned by the Supabase user UUID carried in `sub`
pub fn owner_id(identity: &Identity) -> Result<Uuid, ApiError> {
    identity
        .user_id()
        .map_err(|_| ApiError::unauthorized("User ID in token is not a valid UUID"))
}

/// Path ids are numeric; anything else cannot name a note
pub fn parse_note_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::not_found("Note not found"))
}
