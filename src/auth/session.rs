//! Session key generation, hashing, and cookie helpers.
//!
//! The session key is an opaque 256-bit random value encoded as hex (64 chars).
//! It is stored **hashed** (SHA-256); the raw key only exists in the
//! Set-Cookie header sent to the client, so a store dump doesn't reveal
//! usable sessions.
//!
//! Cookie format: `sessionid=<hex>; HttpOnly; SameSite=Lax; Path=/; Max-Age=<secs>; [Secure]`

use crate::store::{NoteStore, SessionNode};
use anyhow::{Context, Result};
use axum::http::{header, HeaderMap, HeaderValue};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Cookie name for the session key.
pub const SESSION_COOKIE_NAME: &str = "sessionid";

/// Generate a cryptographically random 256-bit key encoded as hex (64 chars).
pub fn generate_session_key() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Hash a raw session key with SHA-256 and return the hex digest.
pub fn hash_session_key(raw_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Build the `Set-Cookie` header value for a session key.
pub fn build_session_cookie(raw_key: &str, max_age_secs: u64, is_secure: bool) -> HeaderValue {
    let secure_flag = if is_secure { "; Secure" } else { "" };
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE_NAME, raw_key, max_age_secs, secure_flag
    );
    // our key is hex-only, so this never fails
    HeaderValue::from_str(&cookie).expect("cookie value is valid ASCII")
}

/// Build a `Set-Cookie` header that clears the session cookie.
pub fn build_clear_cookie(is_secure: bool) -> HeaderValue {
    let secure_flag = if is_secure { "; Secure" } else { "" };
    let cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0{}",
        SESSION_COOKIE_NAME, secure_flag
    );
    HeaderValue::from_str(&cookie).expect("cookie value is valid ASCII")
}

/// Extract the session key from a `Cookie` header value.
pub fn extract_session_key_from_cookie(cookie_header: &str) -> Option<String> {
    let prefix = format!("{}=", SESSION_COOKIE_NAME);
    for part in cookie_header.split(';') {
        let trimmed = part.trim();
        if let Some(value) = trimmed.strip_prefix(&prefix) {
            let key = value.trim();
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }
    }
    None
}

/// Find the session key among all `Cookie` headers of a request.
pub fn session_key_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(extract_session_key_from_cookie)
}

/// Determine whether the `Secure` flag should be set on cookies.
///
/// True only when the service is published over HTTPS.
pub fn should_set_secure(public_url: Option<&str>) -> bool {
    public_url.is_some_and(|url| url.starts_with("https://"))
}

/// Start a session for `user_id` and return the cookie that carries it.
///
/// Expired sessions of any user are purged first. A lifetime that does not
/// fit a timestamp is an error.
pub async fn open_session(
    store: &dyn NoteStore,
    user_id: Uuid,
    max_age_secs: u64,
    is_secure: bool,
) -> Result<HeaderValue> {
    let now = Utc::now();
    let expires_at = i64::try_from(max_age_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .with_context(|| format!("Session lifetime of {}s is out of range", max_age_secs))?;

    match store.purge_expired_sessions().await {
        Ok(0) => {}
        Ok(purged) => tracing::debug!("Purged {} expired sessions", purged),
        Err(e) => tracing::warn!("Failed to purge expired sessions: {:#}", e),
    }

    let raw_key = generate_session_key();
    let session = SessionNode {
        key_hash: hash_session_key(&raw_key),
        user_id,
        created_at: now,
        expires_at,
    };
    store.create_session(&session).await?;
    Ok(build_session_cookie(&raw_key, max_age_secs, is_secure))
}

// ============================================================================
// Tests
// ============================================================================
