//! Shared server state, the HTTP error type and the simple pages

use crate::api::page::Page;
use crate::auth::extractor::{AuthUser, CurrentUser};
use crate::store::{NoteStore, StoreError};
use crate::Config;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

/// Shared server state
pub struct ServerState {
    pub store: Arc<dyn NoteStore>,
    pub config: Config,
}

/// Shared server state handle passed to every handler
pub type SharedState = Arc<ServerState>;

impl ServerState {
    pub fn new(store: Arc<dyn NoteStore>, config: Config) -> SharedState {
        Arc::new(Self { store, config })
    }

    /// Whether cookies must carry the `Secure` flag
    pub fn secure_cookies(&self) -> bool {
        crate::auth::session::should_set_secure(self.config.public_url.as_deref())
    }
}

// ============================================================================
// Simple pages
// ============================================================================

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /: landing page, open to everyone
pub async fn home(CurrentUser(user): CurrentUser) -> Page {
    Page::new("notes/home.html", user.as_ref())
}

/// GET /done/: shown after a successful add, edit or delete
pub async fn success(user: AuthUser) -> Page {
    Page::new("notes/success.html", Some(&user))
}

/// Fallback for unknown routes
pub async fn not_found() -> AppError {
    AppError::NotFound("Page not found".to_string())
}

// ============================================================================
// Errors
// ============================================================================

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<StoreError>() {
            Some(store_err) => AppError::Conflict(store_err.to_string()),
            None => AppError::Internal(err),
        }
    }
}
