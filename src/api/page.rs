//! Page responses
//!
//! A page is a template name plus its render context, sent as JSON:
//! `{"template": "notes/list.html", "context": {"user": "author", ...}}`.
//! Every context carries `user` (the username, or null when anonymous).

use crate::auth::extractor::AuthUser;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// A rendered page
#[derive(Debug, Clone)]
pub struct Page {
    pub template: &'static str,
    pub context: Map<String, Value>,
}

impl Page {
    pub fn new(template: &'static str, user: Option<&AuthUser>) -> Self {
        let mut context = Map::new();
        context.insert(
            "user".to_string(),
            user.map_or(Value::Null, |u| Value::String(u.username.clone())),
        );
        Self { template, context }
    }

    /// Add a context entry
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|e| {
            tracing::warn!("Context value '{}' is not serializable: {}", key, e);
            Value::Null
        });
        self.context.insert(key.to_string(), value);
        self
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        Json(serde_json::json!({
            "template": self.template,
            "context": self.context,
        }))
        .into_response()
    }
}

/// A `302 Found` redirect.
///
/// `axum::response::Redirect` only offers 303/307/308; browsers and the
/// login flow expect the classic 302.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
