//! API route definitions

use super::auth_handlers;
use super::handlers::{self, SharedState};
use super::note_handlers;
use super::urls;
use crate::auth::middleware::require_login;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the router
pub fn create_router(state: SharedState) -> Router {
    // ========================================================================
    // Login required: anonymous users are redirected to the login page
    // ========================================================================
    let protected = Router::new()
        .route(urls::LIST, get(note_handlers::list))
        .route(urls::SUCCESS, get(handlers::success))
        .route(
            urls::ADD,
            get(note_handlers::add_page).post(note_handlers::add),
        )
        .route(urls::DETAIL, get(note_handlers::detail))
        .route(
            urls::EDIT,
            get(note_handlers::edit_page).post(note_handlers::edit),
        )
        .route(
            urls::DELETE,
            get(note_handlers::delete_page).post(note_handlers::delete),
        )
        .route_layer(from_fn_with_state(state.clone(), require_login));

    Router::new()
        // Health check
        .route(urls::HEALTH, get(handlers::health))
        .route(urls::HOME, get(handlers::home))
        // ====================================================================
        // Accounts
        // ====================================================================
        .route(
            urls::SIGNUP,
            get(auth_handlers::signup_form).post(auth_handlers::signup),
        )
        .route(
            urls::LOGIN,
            get(auth_handlers::login_form).post(auth_handlers::login),
        )
        .route(urls::LOGOUT, post(auth_handlers::logout))
        .merge(protected)
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{get as get_req, mock_server_state, post_form};
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_unknown_route_is_404_even_when_anonymous() {
        let app = create_router(mock_server_state());
        let resp = app.oneshot(get_req("/nope/", None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logout_rejects_get() {
        let app = create_router(mock_server_state());
        let resp = app.oneshot(get_req(urls::LOGOUT, None)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_anonymous_post_is_redirected() {
        let app = create_router(mock_server_state());
        let resp = app
            .oneshot(post_form(urls::ADD, "title=x&text=y", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
    }
}
