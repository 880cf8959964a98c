//! `NoteStore` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;
use uuid::Uuid;

use super::client::Neo4jClient;
use super::models::{SessionNode, UserNode};
use super::traits::NoteStore;
use crate::notes::Note;

#[async_trait]
impl NoteStore for Neo4jClient {
    async fn create_user(&self, username: &str, password_hash: &str) -> anyhow::Result<UserNode> {
        self.create_user(username, password_hash).await
    }

    async fn get_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserNode>> {
        self.get_user_by_id(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> anyhow::Result<Option<UserNode>> {
        self.get_user_by_username(username).await
    }

    async fn create_session(&self, session: &SessionNode) -> anyhow::Result<()> {
        self.create_session(session).await
    }

    async fn validate_session(&self, key_hash: &str) -> anyhow::Result<Option<SessionNode>> {
        self.validate_session(key_hash).await
    }

    async fn revoke_session(&self, key_hash: &str) -> anyhow::Result<bool> {
        self.revoke_session(key_hash).await
    }

    async fn purge_expired_sessions(&self) -> anyhow::Result<i64> {
        self.purge_expired_sessions().await
    }

    async fn create_note(&self, note: &Note) -> anyhow::Result<()> {
        self.create_note(note).await
    }

    async fn get_note_by_slug(&self, slug: &str) -> anyhow::Result<Option<Note>> {
        self.get_note_by_slug(slug).await
    }

    async fn get_author_note(&self, author: Uuid, slug: &str) -> anyhow::Result<Option<Note>> {
        self.get_author_note(author, slug).await
    }

    async fn list_author_notes(&self, author: Uuid) -> anyhow::Result<Vec<Note>> {
        self.list_author_notes(author).await
    }

    async fn update_note(
        &self,
        id: Uuid,
        title: &str,
        text: &str,
        slug: &str,
    ) -> anyhow::Result<Option<Note>> {
        self.update_note(id, title, text, slug).await
    }

    async fn delete_note(&self, id: Uuid) -> anyhow::Result<bool> {
        self.delete_note(id).await
    }

    async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> anyhow::Result<bool> {
        self.slug_exists(slug, exclude).await
    }
}
