//! Persistent records: users, login sessions and store-level errors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserNode {
    pub id: Uuid,
    pub username: String,
    /// bcrypt hash, never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

/// A login session.
///
/// Only the SHA-256 hash of the session key is persisted; the raw key lives
/// in the client's `sessionid` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionNode {
    pub key_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionNode {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Uniqueness violations reported by a [`NoteStore`](super::NoteStore).
///
/// Returned wrapped in `anyhow::Error`; callers recover it with
/// `downcast_ref::<StoreError>()`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("a user named '{0}' already exists")]
    UsernameTaken(String),
    #[error("a note with slug '{0}' already exists")]
    SlugTaken(String),
}
