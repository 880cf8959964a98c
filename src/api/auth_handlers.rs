//! Authentication route handlers: signup, session login/logout.
//!
//! Endpoints:
//! - `GET/POST /auth/signup/` : create an account, then redirect to login
//! - `GET/POST /auth/login/`  : username/password login, sets the session cookie
//! - `POST     /auth/logout/` : revokes the session and clears the cookie

use crate::api::handlers::{AppError, SharedState};
use crate::api::page::{found, Page};
use crate::api::urls::is_safe_next;
use crate::auth::extractor::CurrentUser;
use crate::auth::session::{
    build_clear_cookie, hash_session_key, open_session, session_key_from_headers,
};
use crate::forms::{FormContext, FormErrors};
use crate::store::{StoreError, UserNode};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Form,
};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Usernames: letters, digits and `@ . + - _`
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username regex is valid"));

pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MIN_PASSWORD_LENGTH: usize = 8;

const SIGNUP_FIELDS: [&str; 3] = ["username", "password1", "password2"];
const LOGIN_FIELDS: [&str; 2] = ["username", "password"];

const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

// ============================================================================
// Request / Response types
// ============================================================================

/// Urlencoded body of POST /auth/signup/
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

/// Urlencoded body of POST /auth/login/
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Hidden field carried over from the login page
    #[serde(default)]
    pub next: String,
}

/// Query string of the login page
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// ============================================================================
// Validation
// ============================================================================

/// Check a (trimmed) username against the signup rules.
///
/// Shared by the signup form and the `create-user` command.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("This field is required.".to_string());
    }
    if username.chars().count() > MAX_USERNAME_LENGTH || !USERNAME_RE.is_match(username) {
        return Err(format!(
            "Enter a valid username. This value may contain only letters, numbers, \
             and @/./+/-/_ characters, at most {} of them.",
            MAX_USERNAME_LENGTH
        ));
    }
    Ok(())
}

impl SignupForm {
    fn validate(&self) -> FormErrors {
        let mut errors = FormErrors::new();

        if let Err(message) = validate_username(self.username.trim()) {
            errors.add("username", message);
        }

        if self.password1.is_empty() {
            errors.add("password1", "This field is required.");
        }
        if self.password2.is_empty() {
            errors.add("password2", "This field is required.");
        }
        if errors.has("password1") || errors.has("password2") {
            return errors;
        }

        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        } else if self.password1.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password2",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    MIN_PASSWORD_LENGTH
                ),
            );
        } else if self.password1.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password2", "This password is entirely numeric.");
        }

        errors
    }

    /// Bound form for re-rendering; passwords are never echoed back
    fn to_bound_context(&self, errors: FormErrors) -> FormContext {
        FormContext::bound(
            [
                (SIGNUP_FIELDS[0], self.username.trim().to_string()),
                (SIGNUP_FIELDS[1], String::new()),
                (SIGNUP_FIELDS[2], String::new()),
            ],
            errors,
        )
    }
}

/// Check a username/password pair. Never reveals which of the two was wrong.
async fn verify_credentials(
    state: &SharedState,
    username: &str,
    password: &str,
) -> Result<Option<UserNode>, AppError> {
    let Some(user) = state.store.get_user_by_username(username.trim()).await? else {
        return Ok(None);
    };
    let password_ok = bcrypt::verify(password, &user.password_hash).unwrap_or(false);
    Ok(password_ok.then_some(user))
}

fn signup_page(form: FormContext) -> Page {
    Page::new("registration/signup.html", None).with("form", form)
}

fn login_page(form: FormContext, next: &str) -> Page {
    Page::new("registration/login.html", None)
        .with("form", form)
        .with("next", next)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /auth/signup/
pub async fn signup_form(State(state): State<SharedState>) -> Result<Page, AppError> {
    if !state.config.auth.allow_signup {
        return Err(AppError::Forbidden("Signup is disabled".to_string()));
    }
    Ok(signup_page(FormContext::unbound(&SIGNUP_FIELDS)))
}

/// POST /auth/signup/
pub async fn signup(
    State(state): State<SharedState>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    if !state.config.auth.allow_signup {
        return Err(AppError::Forbidden("Signup is disabled".to_string()));
    }

    let mut errors = form.validate();
    let username = form.username.trim();
    if errors.is_empty() && state.store.get_user_by_username(username).await?.is_some() {
        errors.add("username", "A user with that username already exists.");
    }
    if !errors.is_empty() {
        return Ok(signup_page(form.to_bound_context(errors)).into_response());
    }

    let password_hash = bcrypt::hash(&form.password1, state.config.auth.bcrypt_cost)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))?;

    if let Err(e) = state.store.create_user(username, &password_hash).await {
        if let Some(StoreError::UsernameTaken(_)) = e.downcast_ref::<StoreError>() {
            let mut errors = FormErrors::new();
            errors.add("username", "A user with that username already exists.");
            return Ok(signup_page(form.to_bound_context(errors)).into_response());
        }
        return Err(e.into());
    }

    tracing::info!("New user signed up: {}", username);
    Ok(found(&state.config.auth.login_url))
}

/// GET /auth/login/
pub async fn login_form(Query(query): Query<NextQuery>) -> Page {
    login_page(
        FormContext::unbound(&LOGIN_FIELDS),
        query.next.as_deref().unwrap_or_default(),
    )
}

/// POST /auth/login/
///
/// On success the session cookie is set and the client is sent to `next`
/// when it is a local path, otherwise to `login_redirect_url`. A session
/// cookie already on the request is revoked first.
pub async fn login(
    State(state): State<SharedState>,
    Query(query): Query<NextQuery>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = if form.next.is_empty() {
        query.next.unwrap_or_default()
    } else {
        form.next.clone()
    };

    let Some(user) = verify_credentials(&state, &form.username, &form.password).await? else {
        let mut errors = FormErrors::new();
        errors.add(FormErrors::NON_FIELD, INVALID_LOGIN);
        let context = FormContext::bound(
            [
                (LOGIN_FIELDS[0], form.username.trim().to_string()),
                (LOGIN_FIELDS[1], String::new()),
            ],
            errors,
        );
        return Ok(login_page(context, &next).into_response());
    };

    if let Some(old_key) = session_key_from_headers(&headers) {
        state.store.revoke_session(&hash_session_key(&old_key)).await?;
    }

    let cookie = open_session(
        state.store.as_ref(),
        user.id,
        state.config.auth.session_expiry_secs,
        state.secure_cookies(),
    )
    .await?;

    tracing::info!("User logged in: {}", user.username);

    let target = if is_safe_next(&next) {
        next.as_str()
    } else {
        state.config.auth.login_redirect_url.as_str()
    };
    let mut response = found(target);
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

/// POST /auth/logout/
///
/// Always succeeds, even without a session.
pub async fn logout(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(raw_key) = session_key_from_headers(&headers) {
        if state.store.revoke_session(&hash_session_key(&raw_key)).await? {
            if let Some(user) = &user {
                tracing::info!("User logged out: {}", user.username);
            }
        }
    }

    let page = Page::new("registration/logout.html", None);
    Ok((
        [(header::SET_COOKIE, build_clear_cookie(state.secure_cookies()))],
        page,
    )
        .into_response())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::ServerState;
    use crate::api::routes::create_router;
    use crate::store::MemoryStore;
    use crate::test_helpers::{
        get, mock_server_state, post_form, response_json, seed_user, session_cookie, test_config,
    };
    use axum::http::StatusCode;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn form(username: &str, p1: &str, p2: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            password1: p1.to_string(),
            password2: p2.to_string(),
        }
    }

    #[test]
    fn test_signup_validation() {
        assert!(form("author", "pass12345", "pass12345").validate().is_empty());
        assert!(form("a.b@c+d-e_f", "pass12345", "pass12345")
            .validate()
            .is_empty());

        assert!(form("", "pass12345", "pass12345").validate().has("username"));
        assert!(form("has space", "pass12345", "pass12345")
            .validate()
            .has("username"));
        assert!(form(&"x".repeat(151), "pass12345", "pass12345")
            .validate()
            .has("username"));

        assert!(form("author", "pass12345", "pass54321").validate().has("password2"));
        assert!(form("author", "short", "short").validate().has("password2"));
        assert!(form("author", "123456789", "123456789").validate().has("password2"));
        assert!(form("author", "", "").validate().has("password1"));
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("author").is_ok());
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LENGTH)).is_ok());
        assert_eq!(
            validate_username("").unwrap_err(),
            "This field is required."
        );
        assert!(validate_username("has space").is_err());
        assert!(validate_username("semi;colon").is_err());
        assert!(validate_username(&"x".repeat(MAX_USERNAME_LENGTH + 1)).is_err());
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let state = mock_server_state();
        let app = create_router(state.clone());

        let resp = app
            .clone()
            .oneshot(post_form(
                "/auth/signup/",
                "username=newbie&password1=pass12345&password2=pass12345",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[header::LOCATION], crate::api::urls::LOGIN);

        let user = state.store.get_user_by_username("newbie").await.unwrap();
        assert!(user.is_some());

        let resp = app
            .oneshot(post_form(
                "/auth/login/?next=/notes/",
                "username=newbie&password=pass12345",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[header::LOCATION], "/notes/");
        let cookie = resp.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("sessionid="));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_signup_duplicate_username() {
        let state = mock_server_state();
        seed_user(&state, "author", "pass12345").await;

        let resp = create_router(state)
            .oneshot(post_form(
                "/auth/signup/",
                "username=author&password1=pass12345&password2=pass12345",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let json = response_json(resp).await;
        assert_eq!(
            json["context"]["form"]["errors"]["username"][0],
            "A user with that username already exists."
        );
        assert_eq!(json["context"]["form"]["fields"]["password1"], "");
    }

    #[tokio::test]
    async fn test_login_bad_password_rerenders() {
        let state = mock_server_state();
        seed_user(&state, "author", "pass12345").await;

        let resp = create_router(state)
            .oneshot(post_form(
                "/auth/login/",
                "username=author&password=wrong",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());

        let json = response_json(resp).await;
        assert_eq!(json["template"], "registration/login.html");
        assert_eq!(json["context"]["form"]["errors"]["__all__"][0], INVALID_LOGIN);
    }

    #[tokio::test]
    async fn test_login_with_oversized_session_lifetime_is_an_error() {
        let mut config = test_config();
        config.auth.session_expiry_secs = 10_000_000_000_000;
        let state = ServerState::new(Arc::new(MemoryStore::new()), config);
        seed_user(&state, "author", "pass12345").await;

        let resp = create_router(state.clone())
            .oneshot(post_form(
                "/auth/login/",
                "username=author&password=pass12345",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_login_ignores_external_next() {
        let state = mock_server_state();
        seed_user(&state, "author", "pass12345").await;

        let resp = create_router(state)
            .oneshot(post_form(
                "/auth/login/",
                "username=author&password=pass12345&next=//evil.example.com/",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let state = mock_server_state();
        let author = seed_user(&state, "author", "pass12345").await;
        let cookie = session_cookie(&state, &author).await;
        let app = create_router(state);

        let resp = app
            .clone()
            .oneshot(post_form("/auth/logout/", "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0"));
        let json = response_json(resp).await;
        assert_eq!(json["template"], "registration/logout.html");

        let resp = app.oneshot(get("/notes/", Some(&cookie))).await.unwrap();
        assert_eq!(resp.status(), StatusCode::FOUND);
    }
}
