//! Request authentication and the user extractors for Axum handlers.
//!
//! [`authenticate`] resolves the requesting user from the session cookie.
//! [`AuthUser`] reads the user placed in request extensions by the
//! `require_login` middleware; [`CurrentUser`] is the optional variant for
//! public pages.

use crate::api::handlers::{AppError, SharedState};
use crate::auth::session::{hash_session_key, session_key_from_headers};
use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap};
use uuid::Uuid;

/// Authenticated user identity.
///
/// Use this as a handler parameter on routes behind `require_login`:
///
/// ```rust,ignore
/// async fn my_handler(user: AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

/// Resolve the requesting user from the `sessionid` cookie.
///
/// No cookie, an unknown or expired session, or a session whose user is
/// gone all mean `None` (anonymous). Only store failures are errors.
pub async fn authenticate(
    state: &SharedState,
    headers: &HeaderMap,
) -> Result<Option<AuthUser>, AppError> {
    let Some(raw_key) = session_key_from_headers(headers) else {
        return Ok(None);
    };

    let Some(session) = state
        .store
        .validate_session(&hash_session_key(&raw_key))
        .await?
    else {
        tracing::debug!("Ignoring unknown or expired session cookie");
        return Ok(None);
    };

    Ok(state
        .store
        .get_user_by_id(session.user_id)
        .await?
        .map(|user| AuthUser {
            user_id: user.id,
            username: user.username,
        }))
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            AppError::Unauthorized("Authentication required".to_string())
        })
    }
}

/// The requesting user if any, for pages open to everyone.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<AuthUser>);

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(Self(Some(user.clone())));
        }
        Ok(Self(authenticate(state, &parts.headers).await?))
    }
}

// ============================================================================
// Tests
// ============================================================================
