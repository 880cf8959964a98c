//! Neo4j client for users, sessions and notes

use super::models::{SessionNode, StoreError, UserNode};
use crate::notes::Note;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use neo4rs::{query, Graph};
use std::sync::Arc;
use uuid::Uuid;

/// Client for Neo4j operations
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

/// Fixed-width RFC 3339 so that string ordering matches time ordering
fn to_db_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn from_db_time(s: &str) -> DateTime<Utc> {
    s.parse().unwrap_or_else(|_| Utc::now())
}

impl Neo4jClient {
    /// Create a new Neo4j client
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .context("Failed to connect to Neo4j")?;

        let client = Self {
            graph: Arc::new(graph),
        };

        client.init_schema().await?;

        Ok(client)
    }

    /// Initialize the graph schema with constraints and indexes
    async fn init_schema(&self) -> Result<()> {
        let constraints = vec![
            "CREATE CONSTRAINT user_id IF NOT EXISTS FOR (u:User) REQUIRE u.id IS UNIQUE",
            "CREATE CONSTRAINT user_username IF NOT EXISTS FOR (u:User) REQUIRE u.username IS UNIQUE",
            "CREATE CONSTRAINT note_id IF NOT EXISTS FOR (n:Note) REQUIRE n.id IS UNIQUE",
            "CREATE CONSTRAINT note_slug IF NOT EXISTS FOR (n:Note) REQUIRE n.slug IS UNIQUE",
            "CREATE CONSTRAINT session_key IF NOT EXISTS FOR (s:Session) REQUIRE s.key_hash IS UNIQUE",
        ];

        let indexes = vec![
            "CREATE INDEX note_author IF NOT EXISTS FOR (n:Note) ON (n.author_id)",
            "CREATE INDEX session_user IF NOT EXISTS FOR (s:Session) ON (s.user_id)",
            "CREATE INDEX session_expiry IF NOT EXISTS FOR (s:Session) ON (s.expires_at)",
        ];

        for constraint in constraints {
            if let Err(e) = self.graph.run(query(constraint)).await {
                tracing::warn!("Constraint may already exist: {}", e);
            }
        }

        for index in indexes {
            if let Err(e) = self.graph.run(query(index)).await {
                tracing::warn!("Index may already exist: {}", e);
            }
        }

        Ok(())
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Create a user; the username must be unused
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserNode> {
        let user = UserNode {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            date_joined: Utc::now(),
        };

        let q = query(
            r#"
            OPTIONAL MATCH (existing:User {username: $username})
            WITH existing WHERE existing IS NULL
            CREATE (u:User {
                id: $id,
                username: $username,
                password_hash: $password_hash,
                date_joined: $date_joined
            })
            RETURN u
            "#,
        )
        .param("id", user.id.to_string())
        .param("username", user.username.clone())
        .param("password_hash", user.password_hash.clone())
        .param("date_joined", to_db_time(&user.date_joined));

        let mut result = self.graph.execute(q).await?;
        match result.next().await? {
            Some(row) => {
                let node: neo4rs::Node = row.get("u")?;
                self.node_to_user(&node)
            }
            None => Err(StoreError::UsernameTaken(username.to_string()).into()),
        }
    }

    /// Get a user by internal UUID
    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserNode>> {
        let q = query("MATCH (u:User {id: $id}) RETURN u").param("id", id.to_string());

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("u")?;
            Ok(Some(self.node_to_user(&node)?))
        } else {
            Ok(None)
        }
    }

    /// Get a user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<UserNode>> {
        let q = query("MATCH (u:User {username: $username}) RETURN u").param("username", username);

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("u")?;
            Ok(Some(self.node_to_user(&node)?))
        } else {
            Ok(None)
        }
    }

    /// Parse a Neo4j Node into a UserNode
    fn node_to_user(&self, node: &neo4rs::Node) -> Result<UserNode> {
        Ok(UserNode {
            id: node.get::<String>("id")?.parse()?,
            username: node.get("username")?,
            password_hash: node.get("password_hash")?,
            date_joined: from_db_time(&node.get::<String>("date_joined")?),
        })
    }

    // ================================================================
    // Sessions
    // ================================================================

    /// Store a new session (hashed key) linked to a user.
    pub async fn create_session(&self, session: &SessionNode) -> Result<()> {
        let q = query(
            "CREATE (s:Session {
                key_hash: $key_hash,
                user_id: $user_id,
                created_at: $created_at,
                expires_at: $expires_at
            })",
        )
        .param("key_hash", session.key_hash.clone())
        .param("user_id", session.user_id.to_string())
        .param("created_at", to_db_time(&session.created_at))
        .param("expires_at", to_db_time(&session.expires_at));

        self.graph.run(q).await?;
        Ok(())
    }

    /// Validate a session by its key hash. Returns the session if it has
    /// not expired; an expired one is deleted.
    pub async fn validate_session(&self, key_hash: &str) -> Result<Option<SessionNode>> {
        let q = query("MATCH (s:Session {key_hash: $key_hash}) RETURN s")
            .param("key_hash", key_hash.to_string());

        let mut result = self.graph.execute(q).await?;
        match result.next().await? {
            Some(row) => {
                let node: neo4rs::Node = row.get("s")?;
                let session = SessionNode {
                    key_hash: node.get("key_hash")?,
                    user_id: node.get::<String>("user_id")?.parse()?,
                    created_at: from_db_time(&node.get::<String>("created_at")?),
                    expires_at: from_db_time(&node.get::<String>("expires_at")?),
                };

                if session.is_expired() {
                    self.revoke_session(key_hash).await?;
                    Ok(None)
                } else {
                    Ok(Some(session))
                }
            }
            None => Ok(None),
        }
    }

    /// Delete a single session by its key hash.
    pub async fn revoke_session(&self, key_hash: &str) -> Result<bool> {
        let q = query(
            "MATCH (s:Session {key_hash: $key_hash})
             DELETE s
             RETURN count(s) AS count",
        )
        .param("key_hash", key_hash.to_string());

        let mut result = self.graph.execute(q).await?;
        match result.next().await? {
            Some(row) => {
                let count: i64 = row.get("count")?;
                Ok(count > 0)
            }
            None => Ok(false),
        }
    }

    /// Delete all sessions past their expiry.
    ///
    /// Returns the number of deleted sessions.
    pub async fn purge_expired_sessions(&self) -> Result<i64> {
        let q = query(
            "MATCH (s:Session)
             WHERE s.expires_at <= $now
             DELETE s
             RETURN count(s) AS deleted",
        )
        .param("now", to_db_time(&Utc::now()));

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let deleted: i64 = row.get("deleted")?;
            Ok(deleted)
        } else {
            Ok(0)
        }
    }

    // ================================================================
    // Notes
    // ================================================================

    /// Create a note and link it to its author
    pub async fn create_note(&self, note: &Note) -> Result<()> {
        let q = query(
            r#"
            MATCH (u:User {id: $author_id})
            OPTIONAL MATCH (existing:Note {slug: $slug})
            WITH u, existing WHERE existing IS NULL
            CREATE (u)-[:WROTE]->(n:Note {
                id: $id,
                title: $title,
                text: $text,
                slug: $slug,
                author_id: $author_id,
                created_at: $created_at,
                updated_at: $updated_at
            })
            RETURN n
            "#,
        )
        .param("id", note.id.to_string())
        .param("title", note.title.clone())
        .param("text", note.text.clone())
        .param("slug", note.slug.clone())
        .param("author_id", note.author.to_string())
        .param("created_at", to_db_time(&note.created_at))
        .param("updated_at", to_db_time(&note.updated_at));

        let mut result = self.graph.execute(q).await?;
        if result.next().await?.is_some() {
            return Ok(());
        }

        if self.slug_exists(&note.slug, None).await? {
            Err(StoreError::SlugTaken(note.slug.clone()).into())
        } else {
            anyhow::bail!("create_note: author {} not found", note.author)
        }
    }

    /// Get a note by slug (any author)
    pub async fn get_note_by_slug(&self, slug: &str) -> Result<Option<Note>> {
        let q = query("MATCH (n:Note {slug: $slug}) RETURN n").param("slug", slug);

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("n")?;
            Ok(Some(self.node_to_note(&node)?))
        } else {
            Ok(None)
        }
    }

    /// Get a note by slug, restricted to notes written by `author`
    pub async fn get_author_note(&self, author: Uuid, slug: &str) -> Result<Option<Note>> {
        let q = query("MATCH (n:Note {slug: $slug, author_id: $author_id}) RETURN n")
            .param("slug", slug)
            .param("author_id", author.to_string());

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("n")?;
            Ok(Some(self.node_to_note(&node)?))
        } else {
            Ok(None)
        }
    }

    /// List all notes written by `author`, oldest first
    pub async fn list_author_notes(&self, author: Uuid) -> Result<Vec<Note>> {
        let q = query(
            "MATCH (n:Note {author_id: $author_id})
             RETURN n
             ORDER BY n.created_at ASC, n.slug ASC",
        )
        .param("author_id", author.to_string());

        let mut result = self.graph.execute(q).await?;
        let mut notes = Vec::new();
        while let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("n")?;
            notes.push(self.node_to_note(&node)?);
        }
        Ok(notes)
    }

    /// Update title, text and slug of a note
    pub async fn update_note(
        &self,
        id: Uuid,
        title: &str,
        text: &str,
        slug: &str,
    ) -> Result<Option<Note>> {
        let q = query(
            r#"
            MATCH (n:Note {id: $id})
            OPTIONAL MATCH (other:Note {slug: $slug}) WHERE other.id <> $id
            WITH n, other WHERE other IS NULL
            SET n.title = $title,
                n.text = $text,
                n.slug = $slug,
                n.updated_at = $updated_at
            RETURN n
            "#,
        )
        .param("id", id.to_string())
        .param("title", title)
        .param("text", text)
        .param("slug", slug)
        .param("updated_at", to_db_time(&Utc::now()));

        let mut result = self.graph.execute(q).await?;
        if let Some(row) = result.next().await? {
            let node: neo4rs::Node = row.get("n")?;
            return Ok(Some(self.node_to_note(&node)?));
        }

        if self.slug_exists(slug, Some(id)).await? {
            Err(StoreError::SlugTaken(slug.to_string()).into())
        } else {
            Ok(None)
        }
    }

    /// Delete a note and its authorship relationship
    pub async fn delete_note(&self, id: Uuid) -> Result<bool> {
        let q = query(
            "MATCH (n:Note {id: $id})
             DETACH DELETE n
             RETURN count(n) AS count",
        )
        .param("id", id.to_string());

        let mut result = self.graph.execute(q).await?;
        match result.next().await? {
            Some(row) => {
                let count: i64 = row.get("count")?;
                Ok(count > 0)
            }
            None => Ok(false),
        }
    }

    /// Check whether a slug is taken by a note other than `exclude`
    pub async fn slug_exists(&self, slug: &str, exclude: Option<Uuid>) -> Result<bool> {
        let q = query(
            "MATCH (n:Note {slug: $slug})
             WHERE n.id <> $exclude
             RETURN count(n) AS count",
        )
        .param("slug", slug)
        .param(
            "exclude",
            exclude.map(|id| id.to_string()).unwrap_or_default(),
        );

        let mut result = self.graph.execute(q).await?;
        match result.next().await? {
            Some(row) => {
                let count: i64 = row.get("count")?;
                Ok(count > 0)
            }
            None => Ok(false),
        }
    }

    /// Parse a Neo4j Node into a Note
    fn node_to_note(&self, node: &neo4rs::Node) -> Result<Note> {
        Ok(Note {
            id: node.get::<String>("id")?.parse()?,
            title: node.get("title")?,
            text: node.get("text")?,
            slug: node.get("slug")?,
            author: node.get::<String>("author_id")?.parse()?,
            created_at: from_db_time(&node.get::<String>("created_at")?),
            updated_at: from_db_time(&node.get::<String>("updated_at")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_db_time_is_fixed_width_and_sortable() {
        let early = Utc::now();
        let late = early + Duration::milliseconds(1500);
        let (a, b) = (to_db_time(&early), to_db_time(&late));
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }

    #[test]
    fn test_db_time_round_trip_precision() {
        let t = Utc::now();
        let parsed = from_db_time(&to_db_time(&t));
        assert!((parsed - t).num_microseconds().unwrap().abs() < 1);
    }
}
