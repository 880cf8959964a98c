//! Test helper factories and mock state builders
//!
//! Provides a server state over the in-memory store, seeded users/notes,
//! and request builders for driving the router with `oneshot`.
#![allow(dead_code)]

use crate::api::handlers::{ServerState, SharedState};
use crate::auth::session::open_session;
use crate::notes::Note;
use crate::store::{MemoryStore, UserNode};
use crate::{AuthConfig, Config, StorageBackend};
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use std::sync::Arc;

// ============================================================================
// Mock state builders
// ============================================================================

/// Config for tests: memory storage, fast bcrypt
pub fn test_config() -> Config {
    Config {
        server_port: 0,
        public_url: None,
        storage_backend: StorageBackend::Memory,
        neo4j_uri: "bolt://mock:7687".to_string(),
        neo4j_user: "neo4j".to_string(),
        neo4j_password: "mock".to_string(),
        auth: AuthConfig {
            bcrypt_cost: 4,
            ..AuthConfig::default()
        },
    }
}

/// Create a server state with an empty in-memory store
pub fn mock_server_state() -> SharedState {
    ServerState::new(Arc::new(MemoryStore::new()), test_config())
}

// ============================================================================
// Seed data
// ============================================================================

pub async fn seed_user(state: &SharedState, username: &str, password: &str) -> UserNode {
    let hash = bcrypt::hash(password, 4).unwrap(); // cost 4 for fast tests
    state.store.create_user(username, &hash).await.unwrap()
}

pub async fn seed_note(
    state: &SharedState,
    author: &UserNode,
    title: &str,
    text: &str,
    slug: &str,
) -> Note {
    let note = Note::new(author.id, title, text, slug);
    state.store.create_note(&note).await.unwrap();
    note
}

/// Log `user` in and return the `Cookie` header value (`sessionid=...`)
pub async fn session_cookie(state: &SharedState, user: &UserNode) -> String {
    let set_cookie = open_session(state.store.as_ref(), user.id, 3600, false)
        .await
        .unwrap();
    set_cookie
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

// ============================================================================
// Requests
// ============================================================================

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn response_json(resp: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
