//! NoteStore trait definition
//!
//! Defines the abstract interface for every persistence operation the
//! service performs, so handlers can run against Neo4j in production and an
//! in-memory store in tests.

use super::models::{SessionNode, UserNode};
use crate::notes::Note;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Abstract interface for user, session and note persistence.
///
/// Uniqueness violations are reported as [`StoreError`](super::StoreError)
/// wrapped in `anyhow::Error`.
#[async_trait]
pub trait NoteStore: Send + Sync {
    // ========================================================================
    // User operations
    // ========================================================================

    /// Create a user. Fails with `StoreError::UsernameTaken` on duplicates.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserNode>;

    /// Get a user by internal ID
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserNode>>;

    /// Get a user by username (exact match)
    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserNode>>;

    // ========================================================================
    // Session operations
    // ========================================================================

    /// Persist a new session (the key is already hashed)
    async fn create_session(&self, session: &SessionNode) -> Result<()>;

    /// Look up a session by key hash. An expired session is deleted and
    /// reported as absent.
    async fn validate_session(&self, key_hash: &str) -> Result<Option<SessionNode>>;

    /// Delete a session. Returns whether it existed.
    async fn revoke_session(&self, key_hash: &str) -> Result<bool>;

    /// Delete every expired session. Returns how many were removed.
    async fn purge_expired_sessions(&self) -> Result<i64>;

    // ========================================================================
    // Note operations
    // ========================================================================

    /// Create a note. Fails with `StoreError::SlugTaken` on duplicates.
    async fn create_note(&self, note: &Note) -> Result<()>;

    /// Get any note by slug, regardless of author
    async fn get_note_by_slug(&self, slug: &str) -> Result<Option<Note>>;

    /// Get a note by slug, only if it belongs to `author`
    async fn get_author_note(&self, author: Uuid, slug: &str) -> Result<Option<Note>>;

    /// All notes of `author`, oldest first
    async fn list_author_notes(&self, author: Uuid) -> Result<Vec<Note>>;

    /// Replace title, text and slug of a note.
    /// Returns the updated note, or None if the note does not exist.
    async fn update_note(
        &self,
        id: Uuid,
        title: &str,
        text: &str,
        slug: &str,
    ) -> Result<Option<Note>>;

    /// Delete a note. Returns whether it existed.
    async fn delete_note(&self, id: Uuid) -> Result<bool>;

    /// Whether `slug` is used by a note other than `exclude`
    async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool>;
}
