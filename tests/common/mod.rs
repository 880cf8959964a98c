//! Shared fixtures for the router-level tests
//!
//! Every test gets a fresh in-memory store and drives the real router with
//! `tower::ServiceExt::oneshot`; no server or database is needed.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use ya_note::api::create_router;
use ya_note::api::handlers::{ServerState, SharedState};
use ya_note::auth::session::open_session;
use ya_note::notes::Note;
use ya_note::store::{MemoryStore, UserNode};
use ya_note::{AuthConfig, Config, StorageBackend};

pub const PASSWORD: &str = "pass12345";

pub struct TestApp {
    pub state: SharedState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config {
            server_port: 0,
            public_url: None,
            storage_backend: StorageBackend::Memory,
            neo4j_uri: "bolt://unused:7687".to_string(),
            neo4j_user: "neo4j".to_string(),
            neo4j_password: "unused".to_string(),
            auth: AuthConfig {
                bcrypt_cost: 4,
                ..AuthConfig::default()
            },
        };
        let state = ServerState::new(Arc::new(MemoryStore::new()), config);
        let router = create_router(state.clone());
        Self { state, router }
    }

    /// Create a user with [`PASSWORD`]
    pub async fn user(&self, username: &str) -> UserNode {
        let hash = bcrypt::hash(PASSWORD, 4).unwrap();
        self.state.store.create_user(username, &hash).await.unwrap()
    }

    pub async fn note(&self, author: &UserNode, title: &str, text: &str, slug: &str) -> Note {
        let note = Note::new(author.id, title, text, slug);
        self.state.store.create_note(&note).await.unwrap();
        note
    }

    /// Start a session for `user` directly and return its `Cookie` value
    pub async fn force_login(&self, user: &UserNode) -> String {
        let set_cookie = open_session(self.state.store.as_ref(), user.id, 3600, false)
            .await
            .unwrap();
        cookie_pair(set_cookie.to_str().unwrap())
    }

    /// Log in through the login form and return the `Cookie` value
    pub async fn login(&self, username: &str, password: &str) -> Option<String> {
        let resp = self
            .post(
                "/auth/login/",
                &format!("username={}&password={}", username, password),
                None,
            )
            .await;
        resp.headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(cookie_pair)
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }
}

fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().to_string()
}

pub async fn json(resp: Response) -> Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub fn location(resp: &Response) -> &str {
    resp.headers()[header::LOCATION].to_str().unwrap()
}
