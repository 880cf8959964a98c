//! In-memory implementation of NoteStore.
//!
//! Every collection is a `tokio::sync::RwLock<HashMap<K, V>>`. Used by the
//! test suites and by `storage.backend: memory` for local runs; nothing
//! survives a restart.

use super::models::{SessionNode, StoreError, UserNode};
use super::traits::NoteStore;
use crate::notes::Note;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory NoteStore.
///
/// ```
/// use ya_note::store::{MemoryStore, NoteStore};
///
/// # tokio_test::block_on(async {
/// let store = MemoryStore::new();
/// let user = store.create_user("author", "$2b$04$hash").await.unwrap();
/// assert!(store.list_author_notes(user.id).await.unwrap().is_empty());
/// # });
/// ```
#[derive(Default)]
pub struct MemoryStore {
    pub users: RwLock<HashMap<Uuid, UserNode>>,
    pub sessions: RwLock<HashMap<String, SessionNode>>,
    pub notes: RwLock<HashMap<Uuid, Note>>,
}

impl MemoryStore {
    /// Create a new empty MemoryStore.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    // ========================================================================
    // Users
    // ========================================================================

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserNode> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == username) {
            return Err(StoreError::UsernameTaken(username.to_string()).into());
        }
        let user = UserNode {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            date_joined: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserNode>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserNode>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    async fn create_session(&self, session: &SessionNode) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.key_hash.clone(), session.clone());
        Ok(())
    }

    async fn validate_session(&self, key_hash: &str) -> Result<Option<SessionNode>> {
        let mut sessions = self.sessions.write().await;
        if sessions.get(key_hash).is_some_and(SessionNode::is_expired) {
            sessions.remove(key_hash);
            return Ok(None);
        }
        Ok(sessions.get(key_hash).cloned())
    }

    async fn revoke_session(&self, key_hash: &str) -> Result<bool> {
        Ok(self.sessions.write().await.remove(key_hash).is_some())
    }

    async fn purge_expired_sessions(&self) -> Result<i64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired());
        Ok((before - sessions.len()) as i64)
    }

    // ========================================================================
    // Notes
    // ========================================================================

    async fn create_note(&self, note: &Note) -> Result<()> {
        let mut notes = self.notes.write().await;
        if notes.values().any(|n| n.slug == note.slug) {
            return Err(StoreError::SlugTaken(note.slug.clone()).into());
        }
        notes.insert(note.id, note.clone());
        Ok(())
    }

    async fn get_note_by_slug(&self, slug: &str) -> Result<Option<Note>> {
        Ok(self
            .notes
            .read()
            .await
            .values()
            .find(|n| n.slug == slug)
            .cloned())
    }

    async fn get_author_note(&self, author: Uuid, slug: &str) -> Result<Option<Note>> {
        Ok(self
            .notes
            .read()
            .await
            .values()
            .find(|n| n.slug == slug && n.author == author)
            .cloned())
    }

    async fn list_author_notes(&self, author: Uuid) -> Result<Vec<Note>> {
        let notes = self.notes.read().await;
        let mut own: Vec<Note> = notes
            .values()
            .filter(|n| n.author == author)
            .cloned()
            .collect();
        own.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.slug.cmp(&b.slug))
        });
        Ok(own)
    }

    async fn update_note(
        &self,
        id: Uuid,
        title: &str,
        text: &str,
        slug: &str,
    ) -> Result<Option<Note>> {
        let mut notes = self.notes.write().await;
        if notes.values().any(|n| n.slug == slug && n.id != id) {
            return Err(StoreError::SlugTaken(slug.to_string()).into());
        }
        Ok(notes.get_mut(&id).map(|n| {
            n.title = title.to_string();
            n.text = text.to_string();
            n.slug = slug.to_string();
            n.updated_at = Utc::now();
            n.clone()
        }))
    }

    async fn delete_note(&self, id: Uuid) -> Result<bool> {
        Ok(self.notes.write().await.remove(&id).is_some())
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        Ok(self
            .notes
            .read()
            .await
            .values()
            .any(|n| n.slug == slug && Some(n.id) != exclude))
    }
}

// ============================================================================
// Tests
// ============================================================================
