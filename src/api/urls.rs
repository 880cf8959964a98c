//! Named routes
//!
//! Every route has a stable name (`notes:list`, `login`, ...) so callers
//! and tests never hard-code paths. The router is built from the same
//! patterns, so `reverse` and routing cannot drift apart.

use crate::notes::is_valid_slug;

pub const HOME: &str = "/";
pub const LIST: &str = "/notes/";
pub const SUCCESS: &str = "/done/";
pub const ADD: &str = "/add/";
pub const DETAIL: &str = "/note/{slug}/";
pub const EDIT: &str = "/edit/{slug}/";
pub const DELETE: &str = "/delete/{slug}/";
pub const LOGIN: &str = "/auth/login/";
pub const LOGOUT: &str = "/auth/logout/";
pub const SIGNUP: &str = "/auth/signup/";
pub const HEALTH: &str = "/health";

/// Route name → path pattern
pub const ROUTES: &[(&str, &str)] = &[
    ("notes:home", HOME),
    ("notes:list", LIST),
    ("notes:success", SUCCESS),
    ("notes:add", ADD),
    ("notes:detail", DETAIL),
    ("notes:edit", EDIT),
    ("notes:delete", DELETE),
    ("login", LOGIN),
    ("logout", LOGOUT),
    ("signup", SIGNUP),
    ("health", HEALTH),
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NoReverseMatch {
    #[error("no route named '{0}'")]
    UnknownName(String),
    #[error("route '{name}' takes {expected} argument(s), got {given}")]
    WrongArity {
        name: String,
        expected: usize,
        given: usize,
    },
    #[error("'{0}' is not a valid slug")]
    InvalidArgument(String),
}

/// Build the path of a named route, filling `{placeholders}` in order.
///
/// ```
/// use ya_note::api::urls::reverse;
///
/// assert_eq!(reverse("notes:list", &[]).unwrap(), "/notes/");
/// assert_eq!(reverse("notes:edit", &["my-note"]).unwrap(), "/edit/my-note/");
/// assert!(reverse("notes:edit", &[]).is_err());
/// ```
pub fn reverse(name: &str, args: &[&str]) -> Result<String, NoReverseMatch> {
    let pattern = ROUTES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, p)| *p)
        .ok_or_else(|| NoReverseMatch::UnknownName(name.to_string()))?;

    let expected = pattern.matches('{').count();
    if expected != args.len() {
        return Err(NoReverseMatch::WrongArity {
            name: name.to_string(),
            expected,
            given: args.len(),
        });
    }

    let mut path = String::with_capacity(pattern.len());
    let mut rest = pattern;
    for arg in args {
        if !is_valid_slug(arg) {
            return Err(NoReverseMatch::InvalidArgument(arg.to_string()));
        }
        // arity was checked above, so both braces exist
        let (start, end) = match (rest.find('{'), rest.find('}')) {
            (Some(s), Some(e)) => (s, e),
            _ => break,
        };
        path.push_str(&rest[..start]);
        path.push_str(arg);
        rest = &rest[end + 1..];
    }
    path.push_str(rest);
    Ok(path)
}

/// Login redirect target: `{login_url}?next={path}`.
///
/// `/` stays literal in the `next` value, every other reserved character
/// is percent-encoded.
pub fn login_redirect(login_url: &str, next: &str) -> String {
    let encoded = urlencoding::encode(next).replace("%2F", "/");
    format!("{}?next={}", login_url, encoded)
}

/// Whether a `next` value is safe to redirect to (a local absolute path)
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_static_routes() {
        assert_eq!(reverse("notes:home", &[]).unwrap(), "/");
        assert_eq!(reverse("notes:list", &[]).unwrap(), "/notes/");
        assert_eq!(reverse("notes:success", &[]).unwrap(), "/done/");
        assert_eq!(reverse("notes:add", &[]).unwrap(), "/add/");
        assert_eq!(reverse("login", &[]).unwrap(), "/auth/login/");
        assert_eq!(reverse("logout", &[]).unwrap(), "/auth/logout/");
        assert_eq!(reverse("signup", &[]).unwrap(), "/auth/signup/");
    }

    #[test]
    fn test_reverse_slug_routes() {
        assert_eq!(reverse("notes:detail", &["a1"]).unwrap(), "/note/a1/");
        assert_eq!(reverse("notes:edit", &["a1"]).unwrap(), "/edit/a1/");
        assert_eq!(reverse("notes:delete", &["a1"]).unwrap(), "/delete/a1/");
    }

    #[test]
    fn test_reverse_errors() {
        assert_eq!(
            reverse("users:login", &[]),
            Err(NoReverseMatch::UnknownName("users:login".to_string()))
        );
        assert!(matches!(
            reverse("notes:list", &["extra"]),
            Err(NoReverseMatch::WrongArity { expected: 0, given: 1, .. })
        ));
        assert_eq!(
            reverse("notes:detail", &["no spaces"]),
            Err(NoReverseMatch::InvalidArgument("no spaces".to_string()))
        );
    }

    #[test]
    fn test_login_redirect_keeps_slashes() {
        assert_eq!(
            login_redirect("/auth/login/", "/edit/my-note/"),
            "/auth/login/?next=/edit/my-note/"
        );
        assert_eq!(
            login_redirect("/auth/login/", "/notes/?page=2&x=y"),
            "/auth/login/?next=/notes/%3Fpage%3D2%26x%3Dy"
        );
    }

    #[test]
    fn test_is_safe_next() {
        assert!(is_safe_next("/notes/"));
        assert!(!is_safe_next("//evil.example.com/"));
        assert!(!is_safe_next("https://evil.example.com/"));
        assert!(!is_safe_next("/\\evil"));
        assert!(!is_safe_next(""));
    }
}
