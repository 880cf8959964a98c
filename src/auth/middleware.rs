//! Login-required middleware for Axum routes.
//!
//! Resolves the requesting user and injects [`AuthUser`] into request
//! extensions. Anonymous requests are redirected to the login page with the
//! original path in `next`.

use crate::api::handlers::SharedState;
use crate::api::page::found;
use crate::api::urls::login_redirect;
use crate::auth::extractor::authenticate;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Middleware that requires a logged-in user.
///
/// # Behavior
/// 1. Valid session cookie → `AuthUser` injected, request continues
/// 2. No cookie, or an unknown/expired session → 302 to `{login_url}?next={path}`
/// 3. Store failure → 500
pub async fn require_login(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticate(&state, req.headers()).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(None) => {
            let target = req
                .uri()
                .path_and_query()
                .map_or_else(|| req.uri().path().to_string(), |pq| pq.to_string());
            found(&login_redirect(&state.config.auth.login_url, &target))
        }
        Err(e) => e.into_response(),
    }
}

// ============================================================================
// Tests
// ============================================================================
